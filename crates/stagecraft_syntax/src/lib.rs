pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod printer;

pub use error::{SyntaxError, SyntaxResult};

use ast::{ExprKind, FunctionBody, FunctionSource, Program, Span, Stmt};
use chumsky::{Parser, Stream};
use lexer::Token;
use logos::Logos;

/// 词法分析，保留每个 token 的字节范围
pub fn tokenize(source: &str) -> SyntaxResult<Vec<(Token, Span)>> {
    Token::lexer(source)
        .spanned()
        .map(|(tok, span)| match tok {
            Ok(tok) => Ok((tok, span)),
            Err(()) => Err(SyntaxError::Lex {
                text: source[span.clone()].to_string(),
                span,
            }),
        })
        .collect()
}

/// 解析一段脚本
pub fn parse_program(source: &str) -> SyntaxResult<Program> {
    let tokens = tokenize(source)?;
    tracing::trace!(tokens = tokens.len(), "lexed source");

    let eoi = source.len()..source.len() + 1;
    parser::program_parser()
        .parse(Stream::from_iter(eoi, tokens.into_iter()))
        .map_err(|errors| match errors.into_iter().next() {
            Some(err) => SyntaxError::from(err),
            None => SyntaxError::Parse {
                message: "invalid syntax".to_string(),
                span: 0..source.len(),
            },
        })
}

/// 解析一个函数定义 (声明、函数表达式或箭头函数)，拆出参数和函数体
///
/// 箭头函数的表达式体被包装成一条表达式语句。
pub fn parse_function(source: &str) -> SyntaxResult<FunctionSource> {
    let program = parse_program(source)?;
    let whole = 0..source.len();

    let (func, span) = match program.body.as_slice() {
        [Stmt::Function { func, span }] => (func.clone(), span.clone()),
        [Stmt::Expr { expr, span }] => match &expr.kind {
            ExprKind::Function(func) => (func.clone(), span.clone()),
            _ => return Err(SyntaxError::NotAFunction { span: whole }),
        },
        _ => return Err(SyntaxError::NotAFunction { span: whole }),
    };

    let body = match &func.body {
        FunctionBody::Block(body) => body.clone(),
        FunctionBody::Expr(expr) => vec![Stmt::Expr {
            span: expr.span.clone(),
            expr: expr.as_ref().clone(),
        }],
    };

    tracing::debug!(
        params = func.params.len(),
        statements = body.len(),
        "parsed function source"
    );

    Ok(FunctionSource {
        params: func.params.clone(),
        body,
        span,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::*;
    use crate::printer::{expr_to_string, print_program};

    // 解析后再打印，得到规范文本
    fn roundtrip(source: &str) -> String {
        let program = parse_program(source).unwrap();
        print_program(&program)
    }

    fn parse_expr(source: &str) -> Expr {
        let program = parse_program(source).unwrap();
        match program.body.into_iter().next() {
            Some(Stmt::Expr { expr, .. }) => expr,
            other => panic!("Expected expression statement, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_function_declaration() {
        let source = "function some(target) { target.push(1); }";
        let func = parse_function(source).unwrap();
        assert_eq!(func.params.len(), 1);
        assert_eq!(func.params[0].simple_name(), Some("target"));
        assert_eq!(func.body.len(), 1);
    }

    #[test]
    fn test_parse_arrow_expression_body() {
        let func = parse_function("($n, $pow) => x * $pow($n - 1)").unwrap();
        assert_eq!(func.params.len(), 2);
        assert_eq!(func.body.len(), 1);
        match &func.body[0] {
            Stmt::Expr { expr, .. } => {
                assert!(matches!(
                    expr.kind,
                    ExprKind::Binary {
                        op: BinaryOp::Mul,
                        ..
                    }
                ));
            }
            other => panic!("Expected expression statement, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_function_rejects_other_code() {
        let err = parse_function("let a = 1;").unwrap_err();
        assert!(matches!(err, SyntaxError::NotAFunction { .. }));
    }

    #[test]
    fn test_lex_error_has_span() {
        let err = parse_program("let a = #;").unwrap_err();
        match err {
            SyntaxError::Lex { text, span } => {
                assert_eq!(text, "#");
                assert_eq!(span, 8..9);
            }
            other => panic!("Expected lex error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_error_reports_position() {
        let err = parse_program("let a = (1 + ;").unwrap_err();
        assert!(matches!(err, SyntaxError::Parse { .. }));
    }

    #[test]
    fn test_invalid_assignment_target() {
        let err = parse_program("a + b = 1;").unwrap_err();
        assert!(matches!(err, SyntaxError::Parse { .. }));
    }

    #[test]
    fn test_precedence_shape() {
        let expr = parse_expr("a + b * c;");
        match expr.kind {
            ExprKind::Binary { op, right, .. } => {
                assert_eq!(op, BinaryOp::Add);
                assert!(matches!(
                    right.kind,
                    ExprKind::Binary {
                        op: BinaryOp::Mul,
                        ..
                    }
                ));
            }
            other => panic!("Expected binary, got {:?}", other),
        }
    }

    #[test]
    fn test_exponent_is_right_associative() {
        let expr = parse_expr("2 ** 3 ** 2;");
        match expr.kind {
            ExprKind::Binary { op, left, right } => {
                assert_eq!(op, BinaryOp::Pow);
                assert!(matches!(left.kind, ExprKind::Literal(Literal::Number(_))));
                assert!(matches!(
                    right.kind,
                    ExprKind::Binary {
                        op: BinaryOp::Pow,
                        ..
                    }
                ));
            }
            other => panic!("Expected binary, got {:?}", other),
        }
    }

    #[test]
    fn test_member_chain_with_optional_links() {
        let expr = parse_expr("$root.a[\"b\"]?.[k]?.c;");
        assert_eq!(expr.chain_root().as_ident(), Some("$root"));
        assert_eq!(expr_to_string(&expr), "$root.a[\"b\"]?.[k]?.c");
    }

    #[test]
    fn test_roundtrip_statements() {
        let cases = [
            "let a = 1, b;",
            "const [x, y] = pair;",
            "for (let i = 2; i <= 10; i++) {target.push(i);}",
            "for (;;) break;",
            "for (const x of arr) {f(x);}",
            "for (k in obj) g(k);",
            "while (n > 0) n--;",
            "outer: for (const x of xs) {continue outer;}",
            "if (a) x; else {y;}",
            "if (a) {if (b) x;} else y;",
            "try {f();} catch (e) {g(e);} finally {h();}",
            "try {f();} catch {g();}",
            "throw new Error(\"bad\");",
            "function add(a, b = 1, ...rest) {return a + b;}",
            ";",
        ];
        for case in cases {
            assert_eq!(roundtrip(case), case);
        }
    }

    #[test]
    fn test_roundtrip_expressions() {
        let cases = [
            "(a + b) * c;",
            "a - (b - c);",
            "a - b - c;",
            "(-a) ** 2;",
            "- -a;",
            "- -1;",
            "a ?? (b || c);",
            "x = y = 3;",
            "a ? b : c ? d : e;",
            "(a ? b : c) ? d : e;",
            "f(a)(b).c;",
            "f?.(a);",
            "typeof x === \"number\";",
            "arr.map((x) => x * 2);",
            "arr.map((x) => ({v: x}));",
            "({a: 1, \"b c\": 2, [k]: 3});",
            "(function() {return 1;}());",
            "new Date(\"2020-01-01T00:00:00.000Z\").getTime();",
            "obj.new + obj.default;",
            "i++ + ++j;",
        ];
        for case in cases {
            assert_eq!(roundtrip(case), case);
        }
    }

    #[test]
    fn test_object_shorthand_expands() {
        assert_eq!(roundtrip("let o = {a, b: 2};"), "let o = {a: a, b: 2};");
    }

    #[test]
    fn test_semicolons_optional() {
        assert_eq!(roundtrip("let a = 1\nf(a)"), "let a = 1;f(a);");
    }

    #[test]
    fn test_single_param_arrow() {
        assert_eq!(roundtrip("xs.forEach(x => f(x));"), "xs.forEach((x) => f(x));");
    }
}
