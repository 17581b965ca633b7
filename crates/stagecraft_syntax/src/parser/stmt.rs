//! Statement Parser
//!
//! 语句解析：声明、控制流、标签、异常、块与表达式语句

use super::expr::expr_parser;
use super::helpers::{block_parser, ident_parser, params_parser};
use super::pattern::pattern_parser;
use super::ParserError;
use crate::ast::*;
use crate::lexer::Token;
use chumsky::prelude::*;
use std::rc::Rc;

/// 解析语句 (公共接口)
pub fn stmt_parser() -> impl Parser<Token, Stmt, Error = ParserError> + Clone {
    recursive(|stmt| {
        let expr = expr_parser(stmt.clone()).boxed();
        let block = block_parser(stmt.clone()).boxed();

        // 分号可省略
        let semi = just(Token::Semicolon).or_not();

        let paren_expr = expr
            .clone()
            .delimited_by(just(Token::LParen), just(Token::RParen));

        let decl_kind = select! {
            Token::Let => DeclKind::Let,
            Token::Const => DeclKind::Const,
            Token::Var => DeclKind::Var,
        };

        // 变量声明: let a = 1, [b, c] = pair
        let declarator = pattern_parser()
            .then(just(Token::Eq).ignore_then(expr.clone()).or_not())
            .map(|(pattern, init)| Declarator { pattern, init });

        let var_decl = decl_kind
            .then(declarator.separated_by(just(Token::Comma)).at_least(1))
            .map_with_span(|(kind, declarators), span| VarDecl {
                kind,
                declarators,
                span,
            });

        let var_stmt = var_decl
            .clone()
            .then_ignore(semi.clone())
            .map(Stmt::VarDecl);

        // 函数声明: function name(params) { ... }
        let function_decl = just(Token::Function)
            .ignore_then(ident_parser())
            .then(params_parser(expr.clone()))
            .then(block.clone())
            .map_with_span(|((name, params), body), span| Stmt::Function {
                func: Rc::new(Function {
                    name: Some(name),
                    params,
                    body: FunctionBody::Block(body),
                    is_arrow: false,
                }),
                span,
            });

        let block_stmt = block
            .clone()
            .map_with_span(|body, span| Stmt::Block { body, span });

        let return_stmt = just(Token::Return)
            .ignore_then(expr.clone().or_not())
            .then_ignore(semi.clone())
            .map_with_span(|value, span| Stmt::Return { value, span });

        let if_stmt = just(Token::If)
            .ignore_then(paren_expr.clone())
            .then(stmt.clone())
            .then(just(Token::Else).ignore_then(stmt.clone()).or_not())
            .map_with_span(|((test, consequent), alternate), span| Stmt::If {
                test,
                consequent: Box::new(consequent),
                alternate: alternate.map(Box::new),
                span,
            });

        // for (const x of xs) / for (k in obj)
        let for_binding = decl_kind
            .or_not()
            .then(pattern_parser())
            .map(|(decl, pattern)| ForBinding { decl, pattern });

        let iter_kind = just(Token::Of)
            .to(IterKind::Of)
            .or(just(Token::In).to(IterKind::In));

        let for_each = just(Token::For)
            .ignore_then(
                for_binding
                    .then(iter_kind)
                    .then(expr.clone())
                    .delimited_by(just(Token::LParen), just(Token::RParen)),
            )
            .then(stmt.clone())
            .map_with_span(|(((binding, kind), source), body), span| Stmt::ForEach {
                kind,
                binding,
                source,
                body: Box::new(body),
                span,
            });

        // for (init; test; update)
        let for_init = var_decl
            .map(ForInit::VarDecl)
            .or(expr.clone().map(ForInit::Expr));

        let for_classic = just(Token::For)
            .ignore_then(
                for_init
                    .or_not()
                    .then_ignore(just(Token::Semicolon))
                    .then(expr.clone().or_not())
                    .then_ignore(just(Token::Semicolon))
                    .then(expr.clone().or_not())
                    .delimited_by(just(Token::LParen), just(Token::RParen)),
            )
            .then(stmt.clone())
            .map_with_span(|(((init, test), update), body), span| Stmt::For {
                init,
                test,
                update,
                body: Box::new(body),
                span,
            });

        let while_stmt = just(Token::While)
            .ignore_then(paren_expr)
            .then(stmt.clone())
            .map_with_span(|(test, body), span| Stmt::While {
                test,
                body: Box::new(body),
                span,
            });

        let break_stmt = just(Token::Break)
            .ignore_then(ident_parser().or_not())
            .then_ignore(semi.clone())
            .map_with_span(|label, span| Stmt::Break { label, span });

        let continue_stmt = just(Token::Continue)
            .ignore_then(ident_parser().or_not())
            .then_ignore(semi.clone())
            .map_with_span(|label, span| Stmt::Continue { label, span });

        let throw_stmt = just(Token::Throw)
            .ignore_then(expr.clone())
            .then_ignore(semi.clone())
            .map_with_span(|value, span| Stmt::Throw { value, span });

        // try { } catch (e) { } finally { }
        let catch_clause = just(Token::Catch)
            .ignore_then(
                pattern_parser()
                    .delimited_by(just(Token::LParen), just(Token::RParen))
                    .or_not(),
            )
            .then(block.clone())
            .map(|(param, body)| CatchClause { param, body });

        let try_stmt = just(Token::Try)
            .ignore_then(block.clone())
            .then(catch_clause.or_not())
            .then(just(Token::Finally).ignore_then(block).or_not())
            .try_map(|((block, handler), finalizer), span| {
                if handler.is_none() && finalizer.is_none() {
                    return Err(Simple::custom(
                        span,
                        "`try` needs a `catch` or `finally` block",
                    ));
                }
                Ok(Stmt::Try {
                    block,
                    handler,
                    finalizer,
                    span,
                })
            });

        // label: stmt
        let labeled = ident_parser()
            .then_ignore(just(Token::Colon))
            .then(stmt)
            .map_with_span(|(label, body), span| Stmt::Labeled {
                label,
                body: Box::new(body),
                span,
            });

        let empty = just(Token::Semicolon).map_with_span(|_, span| Stmt::Empty { span });

        let expr_stmt = expr
            .then_ignore(semi)
            .map_with_span(|expr, span| Stmt::Expr { expr, span });

        choice((
            var_stmt,
            function_decl,
            block_stmt,
            return_stmt,
            if_stmt,
            for_each,
            for_classic,
            while_stmt,
            break_stmt,
            continue_stmt,
            throw_stmt,
            try_stmt,
            labeled,
            empty,
            expr_stmt,
        ))
    })
}
