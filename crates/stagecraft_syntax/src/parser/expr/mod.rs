//! Expression Parser
//!
//! 表达式解析：字面量、对象、函数、成员链、运算符与赋值

use super::helpers::{block_parser, ident_parser, params_parser, property_name_parser};
use super::ParserError;
use crate::ast::*;
use crate::lexer::Token;
use chumsky::prelude::*;
use chumsky::recursive::Recursive;
use std::rc::Rc;

pub mod literal;

use literal::{literal_parser, number_key};

// 后缀操作: .name / ?.name / [key] / ?.[key] / (args) / ?.(args)
#[derive(Clone)]
enum Postfix {
    Member {
        name: String,
        optional: bool,
        span: Span,
    },
    Index {
        key: Expr,
        optional: bool,
        span: Span,
    },
    Call {
        args: Vec<Expr>,
        optional: bool,
        span: Span,
    },
}

fn apply_postfix(lhs: Expr, op: Postfix) -> Expr {
    match op {
        Postfix::Member {
            name,
            optional,
            span,
        } => {
            let span = lhs.span.start..span.end;
            Expr::new(
                ExprKind::Member {
                    object: Box::new(lhs),
                    property: MemberProperty::Named(name),
                    optional,
                },
                span,
            )
        }
        Postfix::Index {
            key,
            optional,
            span,
        } => {
            let span = lhs.span.start..span.end;
            Expr::new(
                ExprKind::Member {
                    object: Box::new(lhs),
                    property: MemberProperty::Computed(Box::new(key)),
                    optional,
                },
                span,
            )
        }
        Postfix::Call {
            args,
            optional,
            span,
        } => {
            let span = lhs.span.start..span.end;
            Expr::new(
                ExprKind::Call {
                    callee: Box::new(lhs),
                    args,
                    optional,
                },
                span,
            )
        }
    }
}

#[derive(Clone)]
enum Prefix {
    Unary(UnaryOp),
    Update(UpdateOp),
}

fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
    let span = lhs.span.start..rhs.span.end;
    Expr::new(
        ExprKind::Binary {
            op,
            left: Box::new(lhs),
            right: Box::new(rhs),
        },
        span,
    )
}

// 左结合的一层二元运算
fn binary_level<'a>(
    operand: impl Parser<Token, Expr, Error = ParserError> + Clone + 'a,
    ops: impl Parser<Token, BinaryOp, Error = ParserError> + Clone + 'a,
) -> BoxedParser<'a, Token, Expr, ParserError> {
    operand
        .clone()
        .then(ops.then(operand).repeated())
        .foldl(|lhs, (op, rhs)| binary(op, lhs, rhs))
        .boxed()
}

// 只有标识符和非可选的成员访问可以被赋值
fn is_assignable(target: &Expr) -> bool {
    match &target.kind {
        ExprKind::Ident(_) => true,
        ExprKind::Member { .. } => {
            let mut current = target;
            while let ExprKind::Member {
                object, optional, ..
            } = &current.kind
            {
                if *optional {
                    return false;
                }
                current = object;
            }
            true
        }
        _ => false,
    }
}

/// 解析表达式 (赋值层级)
pub fn expr_parser<'a>(
    stmt: Recursive<'a, Token, Stmt, ParserError>,
) -> impl Parser<Token, Expr, Error = ParserError> + Clone + 'a {
    recursive(move |expr| {
        let params = params_parser(expr.clone()).boxed();
        let block = block_parser(stmt).boxed();

        let args = expr
            .clone()
            .separated_by(just(Token::Comma))
            .allow_trailing()
            .delimited_by(just(Token::LParen), just(Token::RParen))
            .boxed();

        // --- 原子 ---
        let ident = ident_parser().map_with_span(|name, span| Expr::ident(name, span));

        let paren = expr
            .clone()
            .delimited_by(just(Token::LParen), just(Token::RParen));

        let array = expr
            .clone()
            .separated_by(just(Token::Comma))
            .allow_trailing()
            .delimited_by(just(Token::LBracket), just(Token::RBracket))
            .map_with_span(|items, span| Expr::new(ExprKind::Array(items), span));

        let computed_key = expr
            .clone()
            .delimited_by(just(Token::LBracket), just(Token::RBracket))
            .map(|key| PropertyKey::Computed(Box::new(key)));

        // a: 1 或简写 a
        let named_property = property_name_parser()
            .map_with_span(|name, span| (name, span))
            .then(just(Token::Colon).ignore_then(expr.clone()).or_not())
            .map(|((name, span), value)| {
                let value = value.unwrap_or_else(|| Expr::ident(name.clone(), span));
                Property {
                    key: PropertyKey::Named(name),
                    value,
                }
            });

        let keyed_property = select! {
            Token::Str(s) => PropertyKey::Named(s),
            Token::Number(n) => PropertyKey::Named(number_key(&n)),
        }
        .or(computed_key)
        .then_ignore(just(Token::Colon))
        .then(expr.clone())
        .map(|(key, value)| Property { key, value });

        let object = named_property
            .or(keyed_property)
            .separated_by(just(Token::Comma))
            .allow_trailing()
            .delimited_by(just(Token::LBrace), just(Token::RBrace))
            .map_with_span(|props, span| Expr::new(ExprKind::Object(props), span));

        let function = just(Token::Function)
            .ignore_then(ident_parser().or_not())
            .then(params.clone())
            .then(block.clone())
            .map_with_span(|((name, params), body), span| {
                let func = Function {
                    name,
                    params,
                    body: FunctionBody::Block(body),
                    is_arrow: false,
                };
                Expr::new(ExprKind::Function(Rc::new(func)), span)
            });

        let atom = choice((literal_parser(), function, array, object, ident, paren)).boxed();

        // --- 成员链与调用 ---
        let dot_member = just(Token::Dot)
            .ignore_then(property_name_parser())
            .map_with_span(|name, span| Postfix::Member {
                name,
                optional: false,
                span,
            });

        let index = expr
            .clone()
            .delimited_by(just(Token::LBracket), just(Token::RBracket))
            .map_with_span(|key, span| Postfix::Index {
                key,
                optional: false,
                span,
            });

        let call = args.clone().map_with_span(|args, span| Postfix::Call {
            args,
            optional: false,
            span,
        });

        let optional_link = just(Token::QuestionDot).ignore_then(choice((
            expr.clone()
                .delimited_by(just(Token::LBracket), just(Token::RBracket))
                .map_with_span(|key, span| Postfix::Index {
                    key,
                    optional: true,
                    span,
                }),
            args.clone().map_with_span(|args, span| Postfix::Call {
                args,
                optional: true,
                span,
            }),
            property_name_parser().map_with_span(|name, span| Postfix::Member {
                name,
                optional: true,
                span,
            }),
        )));

        // new Callee(args)：callee 只允许成员访问，不允许调用
        let new_expr = just(Token::New)
            .ignore_then(
                atom.clone()
                    .then(dot_member.clone().or(index.clone()).repeated())
                    .foldl(apply_postfix),
            )
            .then(args.clone().or_not())
            .map_with_span(|(callee, args), span| {
                Expr::new(
                    ExprKind::New {
                        callee: Box::new(callee),
                        args: args.unwrap_or_default(),
                    },
                    span,
                )
            });

        let chain = new_expr
            .or(atom)
            .then(choice((dot_member, index, call, optional_link)).repeated())
            .foldl(apply_postfix)
            .boxed();

        // --- 后缀自增自减 ---
        let update_op = just(Token::PlusPlus)
            .to(UpdateOp::Increment)
            .or(just(Token::MinusMinus).to(UpdateOp::Decrement));

        let postfix = chain
            .then(update_op.map_with_span(|op, span: Span| (op, span)).or_not())
            .map(|(target, update)| match update {
                Some((op, op_span)) => {
                    let span = target.span.start..op_span.end;
                    Expr::new(
                        ExprKind::Update {
                            op,
                            prefix: false,
                            target: Box::new(target),
                        },
                        span,
                    )
                }
                None => target,
            })
            .boxed();

        // --- 前缀运算符 (!, -, +, typeof, ++, --) ---
        let prefix_op = choice((
            just(Token::Bang).to(Prefix::Unary(UnaryOp::Not)),
            just(Token::Minus).to(Prefix::Unary(UnaryOp::Neg)),
            just(Token::Plus).to(Prefix::Unary(UnaryOp::Plus)),
            just(Token::Typeof).to(Prefix::Unary(UnaryOp::Typeof)),
            just(Token::PlusPlus).to(Prefix::Update(UpdateOp::Increment)),
            just(Token::MinusMinus).to(Prefix::Update(UpdateOp::Decrement)),
        ))
        .map_with_span(|op, span: Span| (op, span));

        let unary = prefix_op
            .repeated()
            .then(postfix)
            .foldr(|(op, op_span), operand| {
                let span = op_span.start..operand.span.end;
                let kind = match op {
                    Prefix::Unary(op) => ExprKind::Unary {
                        op,
                        operand: Box::new(operand),
                    },
                    Prefix::Update(op) => ExprKind::Update {
                        op,
                        prefix: true,
                        target: Box::new(operand),
                    },
                };
                Expr::new(kind, span)
            })
            .boxed();

        // --- 幂运算 (右结合) ---
        let exponent = unary
            .clone()
            .then(just(Token::StarStar).ignore_then(unary).repeated())
            .map(|(first, mut rest)| {
                let Some(mut acc) = rest.pop() else {
                    return first;
                };
                while let Some(lhs) = rest.pop() {
                    acc = binary(BinaryOp::Pow, lhs, acc);
                }
                binary(BinaryOp::Pow, first, acc)
            })
            .boxed();

        let product = binary_level(
            exponent,
            choice((
                just(Token::Star).to(BinaryOp::Mul),
                just(Token::Slash).to(BinaryOp::Div),
                just(Token::Percent).to(BinaryOp::Mod),
            )),
        );

        let sum = binary_level(
            product,
            just(Token::Plus)
                .to(BinaryOp::Add)
                .or(just(Token::Minus).to(BinaryOp::Sub)),
        );

        let relational = binary_level(
            sum,
            choice((
                just(Token::Leq).to(BinaryOp::Leq),
                just(Token::Geq).to(BinaryOp::Geq),
                just(Token::Lt).to(BinaryOp::Lt),
                just(Token::Gt).to(BinaryOp::Gt),
            )),
        );

        let equality = binary_level(
            relational,
            choice((
                just(Token::EqEqEq).to(BinaryOp::StrictEq),
                just(Token::NotEqEq).to(BinaryOp::StrictNotEq),
                just(Token::EqEq).to(BinaryOp::Eq),
                just(Token::NotEq).to(BinaryOp::NotEq),
            )),
        );

        let logical_and = binary_level(equality, just(Token::And).to(BinaryOp::And));
        let logical_or = binary_level(logical_and, just(Token::Or).to(BinaryOp::Or));
        let nullish = binary_level(
            logical_or,
            just(Token::QuestionQuestion).to(BinaryOp::Nullish),
        );

        // --- 条件表达式 ---
        let conditional = nullish
            .then(
                just(Token::Question)
                    .ignore_then(expr.clone())
                    .then_ignore(just(Token::Colon))
                    .then(expr.clone())
                    .or_not(),
            )
            .map_with_span(|(test, branches), span| match branches {
                Some((consequent, alternate)) => Expr::new(
                    ExprKind::Conditional {
                        test: Box::new(test),
                        consequent: Box::new(consequent),
                        alternate: Box::new(alternate),
                    },
                    span,
                ),
                None => test,
            })
            .boxed();

        // --- 赋值 (右结合) ---
        let assign_op = select! {
            Token::Eq => AssignOp::Assign,
            Token::PlusEq => AssignOp::Add,
            Token::MinusEq => AssignOp::Sub,
            Token::StarEq => AssignOp::Mul,
            Token::SlashEq => AssignOp::Div,
            Token::PercentEq => AssignOp::Mod,
        };

        let assignment = conditional
            .then(assign_op.then(expr.clone()).or_not())
            .try_map(|(target, rhs), span| match rhs {
                None => Ok(target),
                Some((op, value)) => {
                    if !is_assignable(&target) {
                        return Err(Simple::custom(
                            target.span.clone(),
                            "invalid assignment target",
                        ));
                    }
                    Ok(Expr::new(
                        ExprKind::Assign {
                            op,
                            target: Box::new(target),
                            value: Box::new(value),
                        },
                        span,
                    ))
                }
            });

        // --- 箭头函数: x => e, (a, b) => { ... } ---
        let arrow_params = ident_parser()
            .map_with_span(|name, span| vec![Param::simple(name, span)])
            .or(params);

        let arrow_body = block
            .map(FunctionBody::Block)
            .or(expr.map(|body| FunctionBody::Expr(Box::new(body))));

        let arrow = arrow_params
            .then_ignore(just(Token::Arrow))
            .then(arrow_body)
            .map_with_span(|(params, body), span| {
                let func = Function {
                    name: None,
                    params,
                    body,
                    is_arrow: true,
                };
                Expr::new(ExprKind::Function(Rc::new(func)), span)
            });

        arrow.or(assignment)
    })
}
