//! Parser Module
//!
//! 基于 chumsky 的组合子解析器，输入为 (Token, Span) 流

pub mod expr;
pub mod helpers;
pub mod pattern;
pub mod stmt;

use crate::ast::Program;
use crate::lexer::Token;
use chumsky::prelude::*;

pub type ParserError = Simple<Token>;

/// 主入口：解析整个程序
pub fn program_parser() -> impl Parser<Token, Program, Error = ParserError> {
    stmt::stmt_parser()
        .repeated()
        .then_ignore(end())
        .map(|body| Program { body })
}
