//! Parser Helper Functions
//!
//! 辅助解析函数：标识符、属性名、参数列表、块

use super::pattern::pattern_parser;
use super::ParserError;
use crate::ast::{Expr, Param, Stmt};
use crate::lexer::Token;
use chumsky::prelude::*;

/// 解析标识符
#[allow(clippy::result_large_err)]
pub fn ident_parser() -> impl Parser<Token, String, Error = ParserError> + Clone {
    select! { Token::Ident(ident) => ident }
}

/// 属性名：标识符或关键字 (`obj.new`, `{ default: 1 }`)
pub fn property_name_parser() -> impl Parser<Token, String, Error = ParserError> + Clone {
    filter_map(|span, token: Token| match token {
        Token::Ident(name) => Ok(name),
        other => match other.keyword() {
            Some(keyword) => Ok(keyword.to_string()),
            None => Err(Simple::expected_input_found(span, Vec::new(), Some(other))),
        },
    })
}

/// 参数列表: (a, [b, c], d = 1, ...rest)
pub fn params_parser<'a>(
    expr: impl Parser<Token, Expr, Error = ParserError> + Clone + 'a,
) -> impl Parser<Token, Vec<Param>, Error = ParserError> + Clone + 'a {
    let param = just(Token::Ellipsis)
        .or_not()
        .then(pattern_parser())
        .then(just(Token::Eq).ignore_then(expr).or_not())
        .map_with_span(|((rest, pattern), default), span| Param {
            pattern,
            default,
            rest: rest.is_some(),
            span,
        });

    param
        .separated_by(just(Token::Comma))
        .allow_trailing()
        .delimited_by(just(Token::LParen), just(Token::RParen))
}

/// 块: { stmt* }
pub fn block_parser<'a>(
    stmt: impl Parser<Token, Stmt, Error = ParserError> + Clone + 'a,
) -> impl Parser<Token, Vec<Stmt>, Error = ParserError> + Clone + 'a {
    stmt.repeated()
        .delimited_by(just(Token::LBrace), just(Token::RBrace))
}
