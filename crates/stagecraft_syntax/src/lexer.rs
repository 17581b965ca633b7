use logos::Logos;
use std::fmt;

#[derive(Logos, Debug, PartialEq, Eq, Hash, Clone)] // Simple<Token> 需要 Eq 和 Hash
#[logos(skip r"[ \t\r\n\f]+")]
pub enum Token {
    // --- 关键字 (Keywords) ---
    #[token("function")]
    Function,
    #[token("return")]
    Return,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("for")]
    For,
    #[token("of")]
    Of,
    #[token("in")]
    In,
    #[token("while")]
    While,
    #[token("break")]
    Break,
    #[token("continue")]
    Continue,
    #[token("let")]
    Let,
    #[token("const")]
    Const,
    #[token("var")]
    Var,
    #[token("new")]
    New,
    #[token("typeof")]
    Typeof,
    #[token("throw")]
    Throw,
    #[token("try")]
    Try,
    #[token("catch")]
    Catch,
    #[token("finally")]
    Finally,

    // 字面量关键字
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("null")]
    Null,
    #[token("undefined")]
    Undefined,

    // --- 符号 (Symbols) ---
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("**")]
    StarStar,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("++")]
    PlusPlus,
    #[token("--")]
    MinusMinus,

    #[token("=")]
    Eq,
    #[token("+=")]
    PlusEq,
    #[token("-=")]
    MinusEq,
    #[token("*=")]
    StarEq,
    #[token("/=")]
    SlashEq,
    #[token("%=")]
    PercentEq,

    #[token("==")]
    EqEq,
    #[token("===")]
    EqEqEq,
    #[token("!=")]
    NotEq,
    #[token("!==")]
    NotEqEq,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("<=")]
    Leq,
    #[token(">=")]
    Geq,

    #[token("!")]
    Bang,
    #[token("&&")]
    And,
    #[token("||")]
    Or,

    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,

    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token("...")]
    Ellipsis,
    #[token(":")]
    Colon,
    #[token(";")]
    Semicolon,
    #[token("?")]
    Question,
    #[token("?.")]
    QuestionDot,
    #[token("??")]
    QuestionQuestion,
    #[token("=>")]
    Arrow,

    // --- 复杂数据 (Data) ---
    #[regex(r"[a-zA-Z_$][a-zA-Z0-9_$]*", |lex| lex.slice().to_string())]
    Ident(String),

    // 为了 Hash 实现，数字先存 String，AST 阶段再转 f64
    #[regex(r"[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?", |lex| lex.slice().to_string())]
    Number(String),

    #[regex(r#""([^"\\\n]|\\.)*""#, |lex| unescape(lex.slice()))]
    #[regex(r"'([^'\\\n]|\\.)*'", |lex| unescape(lex.slice()))]
    Str(String),

    #[regex(r"//[^\n]*", logos::skip, allow_greedy = true)]
    #[regex(r"/\*([^*]|\*+[^*/])*\*+/", logos::skip)]
    Comment,
}

/// 去掉引号并处理转义序列
fn unescape(quoted: &str) -> String {
    let inner = &quoted[1..quoted.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{c}'),
            Some('0') => out.push('\0'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => {
                        out.push_str("\\u");
                        out.push_str(&hex);
                    }
                }
            }
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

impl Token {
    /// 关键字的源码文本；可以出现在 `.` 之后作为属性名
    pub fn keyword(&self) -> Option<&'static str> {
        let text = match self {
            Token::Function => "function",
            Token::Return => "return",
            Token::If => "if",
            Token::Else => "else",
            Token::For => "for",
            Token::Of => "of",
            Token::In => "in",
            Token::While => "while",
            Token::Break => "break",
            Token::Continue => "continue",
            Token::Let => "let",
            Token::Const => "const",
            Token::Var => "var",
            Token::New => "new",
            Token::Typeof => "typeof",
            Token::Throw => "throw",
            Token::Try => "try",
            Token::Catch => "catch",
            Token::Finally => "finally",
            Token::True => "true",
            Token::False => "false",
            Token::Null => "null",
            Token::Undefined => "undefined",
            _ => return None,
        };
        Some(text)
    }

    fn symbol(&self) -> &'static str {
        match self {
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::StarStar => "**",
            Token::Slash => "/",
            Token::Percent => "%",
            Token::PlusPlus => "++",
            Token::MinusMinus => "--",
            Token::Eq => "=",
            Token::PlusEq => "+=",
            Token::MinusEq => "-=",
            Token::StarEq => "*=",
            Token::SlashEq => "/=",
            Token::PercentEq => "%=",
            Token::EqEq => "==",
            Token::EqEqEq => "===",
            Token::NotEq => "!=",
            Token::NotEqEq => "!==",
            Token::Lt => "<",
            Token::Gt => ">",
            Token::Leq => "<=",
            Token::Geq => ">=",
            Token::Bang => "!",
            Token::And => "&&",
            Token::Or => "||",
            Token::LParen => "(",
            Token::RParen => ")",
            Token::LBrace => "{",
            Token::RBrace => "}",
            Token::LBracket => "[",
            Token::RBracket => "]",
            Token::Comma => ",",
            Token::Dot => ".",
            Token::Ellipsis => "...",
            Token::Colon => ":",
            Token::Semicolon => ";",
            Token::Question => "?",
            Token::QuestionDot => "?.",
            Token::QuestionQuestion => "??",
            Token::Arrow => "=>",
            _ => "",
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(keyword) = self.keyword() {
            return write!(f, "`{}`", keyword);
        }
        match self {
            Token::Ident(name) => write!(f, "identifier `{}`", name),
            Token::Number(text) => write!(f, "number `{}`", text),
            Token::Str(text) => write!(f, "string {:?}", text),
            Token::Comment => write!(f, "comment"),
            other => write!(f, "`{}`", other.symbol()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lexer_basic() {
        let code = "let $a = 10 + b;";
        let mut lexer = Token::lexer(code);

        assert_eq!(lexer.next(), Some(Ok(Token::Let)));
        assert_eq!(lexer.next(), Some(Ok(Token::Ident("$a".to_string()))));
        assert_eq!(lexer.next(), Some(Ok(Token::Eq)));
        assert_eq!(lexer.next(), Some(Ok(Token::Number("10".to_string()))));
        assert_eq!(lexer.next(), Some(Ok(Token::Plus)));
        assert_eq!(lexer.next(), Some(Ok(Token::Ident("b".to_string()))));
        assert_eq!(lexer.next(), Some(Ok(Token::Semicolon)));
        assert_eq!(lexer.next(), None);
    }

    #[test]
    fn test_lexer_longest_operators() {
        let tokens: Vec<_> = Token::lexer("a?.b ?? c === d !== e ** 2 ... =>")
            .map(|t| t.unwrap())
            .collect();
        assert_eq!(
            tokens,
            vec![
                Token::Ident("a".into()),
                Token::QuestionDot,
                Token::Ident("b".into()),
                Token::QuestionQuestion,
                Token::Ident("c".into()),
                Token::EqEqEq,
                Token::Ident("d".into()),
                Token::NotEqEq,
                Token::Ident("e".into()),
                Token::StarStar,
                Token::Number("2".into()),
                Token::Ellipsis,
                Token::Arrow,
            ]
        );
    }

    #[test]
    fn test_lexer_strings_and_comments() {
        let tokens: Vec<_> = Token::lexer("'it\\'s' /* skip */ \"a\\nb\" // tail")
            .map(|t| t.unwrap())
            .collect();
        assert_eq!(
            tokens,
            vec![Token::Str("it's".into()), Token::Str("a\nb".into())]
        );
    }

    #[test]
    fn test_keywords_are_not_identifiers() {
        let tokens: Vec<_> = Token::lexer("of offset").map(|t| t.unwrap()).collect();
        assert_eq!(tokens, vec![Token::Of, Token::Ident("offset".into())]);
    }
}
