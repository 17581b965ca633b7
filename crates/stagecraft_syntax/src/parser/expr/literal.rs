use crate::ast::{format_number, Expr, ExprKind, Literal};
use crate::lexer::Token;
use chumsky::prelude::*;

use crate::parser::ParserError;

/// 解析字面量值 (Primitive)
#[allow(clippy::result_large_err)]
pub fn literal_value_parser() -> impl Parser<Token, Literal, Error = ParserError> + Clone {
    select! {
        Token::Number(text) => Literal::Number(parse_number(&text)),
        Token::Str(s) => Literal::String(s),
        Token::True => Literal::Bool(true),
        Token::False => Literal::Bool(false),
        Token::Null => Literal::Null,
        Token::Undefined => Literal::Undefined,
    }
}

/// 解析字面量表达式
pub fn literal_parser() -> impl Parser<Token, Expr, Error = ParserError> + Clone {
    literal_value_parser().map_with_span(|lit, span| Expr::new(ExprKind::Literal(lit), span))
}

pub fn parse_number(text: &str) -> f64 {
    text.parse().unwrap_or(f64::NAN)
}

/// 数字作为对象键时的规范文本: { 1.50: x } -> "1.5"
pub fn number_key(text: &str) -> String {
    format_number(parse_number(text))
}
