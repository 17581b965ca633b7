use crate::ast::Span;
use crate::lexer::Token;
use chumsky::error::{Simple, SimpleReason};
use thiserror::Error;

pub type SyntaxResult<T> = Result<T, SyntaxError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SyntaxError {
    #[error("unrecognized input `{text}`")]
    Lex { text: String, span: Span },

    #[error("{message}")]
    Parse { message: String, span: Span },

    #[error("expected a function declaration, function expression or arrow function")]
    NotAFunction { span: Span },
}

impl SyntaxError {
    pub fn span(&self) -> Span {
        match self {
            SyntaxError::Lex { span, .. }
            | SyntaxError::Parse { span, .. }
            | SyntaxError::NotAFunction { span } => span.clone(),
        }
    }
}

impl From<Simple<Token>> for SyntaxError {
    fn from(err: Simple<Token>) -> Self {
        let message = match err.reason() {
            SimpleReason::Custom(msg) => msg.clone(),
            SimpleReason::Unclosed { delimiter, .. } => format!("unclosed delimiter {}", delimiter),
            SimpleReason::Unexpected => {
                let found = match err.found() {
                    Some(token) => token.to_string(),
                    None => "end of input".to_string(),
                };
                let mut expected: Vec<String> = err
                    .expected()
                    .map(|token| match token {
                        Some(token) => token.to_string(),
                        None => "end of input".to_string(),
                    })
                    .collect();
                expected.sort();
                expected.dedup();
                if expected.is_empty() {
                    format!("unexpected {}", found)
                } else {
                    format!("unexpected {}, expected {}", found, expected.join(", "))
                }
            }
        };
        SyntaxError::Parse {
            message,
            span: err.span(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chumsky::Error as _;

    #[test]
    fn test_unexpected_token_message() {
        let err: Simple<Token> =
            Simple::expected_input_found(4..5, vec![Some(Token::RParen)], Some(Token::Comma));
        let converted = SyntaxError::from(err);
        assert_eq!(converted.to_string(), "unexpected `,`, expected `)`");
        assert_eq!(converted.span(), 4..5);
    }

    #[test]
    fn test_custom_message() {
        let err: Simple<Token> = Simple::custom(0..3, "invalid assignment target");
        assert_eq!(
            SyntaxError::from(err).to_string(),
            "invalid assignment target"
        );
    }
}
