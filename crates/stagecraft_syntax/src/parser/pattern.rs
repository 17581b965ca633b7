use super::helpers::{ident_parser, property_name_parser};
use super::ParserError;
use crate::ast::{Pattern, PropertyPattern};
use crate::lexer::Token;
use chumsky::prelude::*;

/// 绑定模式: x | [a, b] | { key: value, short }
pub fn pattern_parser() -> impl Parser<Token, Pattern, Error = ParserError> + Clone {
    recursive(|pat| {
        let ident = ident_parser().map(Pattern::Ident);

        let array = pat
            .clone()
            .separated_by(just(Token::Comma))
            .allow_trailing()
            .delimited_by(just(Token::LBracket), just(Token::RBracket))
            .map(Pattern::Array);

        // { a } 是 { a: a } 的简写
        let property = property_name_parser()
            .then(just(Token::Colon).ignore_then(pat).or_not())
            .map(|(key, value)| {
                let value = value.unwrap_or_else(|| Pattern::Ident(key.clone()));
                PropertyPattern { key, value }
            });

        let object = property
            .separated_by(just(Token::Comma))
            .allow_trailing()
            .delimited_by(just(Token::LBrace), just(Token::RBrace))
            .map(Pattern::Object);

        choice((ident, array, object))
    })
}
