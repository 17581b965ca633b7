//! Generator Program Executor
//!
//! 在生成期环境里执行指令列表，把输出拼接成最终的程序文本。

use crate::context::Context;
use crate::error::{StagingError, StagingResult};
use crate::program::{GeneratorProgram, Instruction};
use crate::serialize::serialize;
use stagecraft_runtime::{iterate, BindMode, Env, Interpreter, Value};
use stagecraft_syntax::ast::{Expr, ExprKind};
use stagecraft_syntax::printer::Precedence;

// 指令执行后的控制流
#[derive(Debug, PartialEq)]
enum Flow {
    Normal,
    Break(String),
    Continue(String),
}

struct Executor {
    interp: Interpreter,
    out: String,
}

/// 用上下文执行生成器程序
///
/// 每个分段参数都必须在上下文中有值，多余的条目被忽略。
pub fn execute(program: &GeneratorProgram, context: &Context) -> StagingResult<String> {
    let mut executor = Executor {
        interp: Interpreter::new(),
        out: String::new(),
    };
    let env = executor.interp.globals().child();
    for name in &program.params {
        let value = context
            .get(name)
            .ok_or_else(|| StagingError::MissingContext { name: name.clone() })?;
        env.declare(name.clone(), value.clone(), false);
    }

    // 能走到顶层的跳转已在改写阶段被拒绝
    executor.run(&program.instructions, &env)?;
    Ok(executor.out)
}

impl Executor {
    fn run(&mut self, instructions: &[Instruction], env: &Env) -> StagingResult<Flow> {
        for instr in instructions {
            let flow = self.step(instr, env)?;
            if flow != Flow::Normal {
                return Ok(flow);
            }
        }
        Ok(Flow::Normal)
    }

    fn step(&mut self, instr: &Instruction, env: &Env) -> StagingResult<Flow> {
        match instr {
            Instruction::Literal(text) => self.out.push_str(text),
            Instruction::Inline {
                expr,
                min,
                at_start,
            } => {
                let value = self.interp.eval_expr(expr, env)?;
                let text = serialize(&value)?;
                if needs_parens(&value, &text, *min, *at_start) {
                    self.out.push('(');
                    self.out.push_str(&text);
                    self.out.push(')');
                } else {
                    self.out.push_str(&text);
                }
            }
            Instruction::Call(expr) => {
                self.check_callable(expr, env)?;
                let value = self.interp.eval_expr(expr, env)?;
                self.out.push_str(&value.to_string());
            }
            Instruction::If {
                test,
                then,
                otherwise,
            } => {
                if self.interp.eval_expr(test, env)?.truthy() {
                    return self.run(then, &env.child());
                } else if let Some(otherwise) = otherwise {
                    return self.run(otherwise, &env.child());
                }
            }
            Instruction::Each {
                label,
                kind,
                pattern,
                source,
                declare,
                body,
            } => {
                let collection = self.interp.eval_expr(source, env)?;
                for item in iterate(*kind, &collection)? {
                    let scope = env.child();
                    self.interp.bind_pattern(
                        pattern,
                        item,
                        &scope,
                        BindMode::Declare { mutable: false },
                    )?;

                    self.out.push('{');
                    for name in declare {
                        let value = scope.get(name)?;
                        self.out.push_str(&format!("let {} = {};", name, serialize(&value)?));
                    }
                    let flow = self.run(body, &scope)?;
                    self.out.push('}');

                    match flow {
                        Flow::Normal => {}
                        Flow::Continue(target) if label.as_deref() == Some(target.as_str()) => {}
                        Flow::Break(target) if label.as_deref() == Some(target.as_str()) => break,
                        other => return Ok(other),
                    }
                }
            }
            Instruction::Block(body) => {
                self.out.push('{');
                let flow = self.run(body, env)?;
                self.out.push('}');
                return Ok(flow);
            }
            Instruction::Break(label) => return Ok(Flow::Break(label.clone())),
            Instruction::Continue(label) => return Ok(Flow::Continue(label.clone())),
        }
        Ok(Flow::Normal)
    }

    // 分段调用的目标必须是函数
    fn check_callable(&mut self, expr: &Expr, env: &Env) -> StagingResult<()> {
        let ExprKind::Call { callee, .. } = &expr.kind else {
            return Ok(());
        };
        let Some(name) = callee.as_ident() else {
            return Ok(());
        };
        let value = env.get(name)?;
        if value.as_function().is_none() {
            return Err(StagingError::NotCallable {
                name: name.to_string(),
                found: value.type_name(),
                span: expr.span.clone(),
            });
        }
        Ok(())
    }
}

// 序列化文本放进所在位置后是否会被读错；原样插入的代码不处理
fn needs_parens(value: &Value, text: &str, min: Precedence, at_start: bool) -> bool {
    match value {
        Value::Raw(_) => false,
        // `2.toString()` 中的点被读成小数点
        Value::Number(_) if min >= Precedence::Call => true,
        _ => {
            (min >= Precedence::Unary && text.starts_with('-'))
                || (at_start && text.starts_with('{'))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::GeneratorOptions;
    use crate::registry::Registry;
    use crate::rewrite::rewrite;
    use stagecraft_syntax::parse_function;

    fn build(source: &str, options: GeneratorOptions, context: &Context) -> StagingResult<String> {
        let func = parse_function(source).unwrap();
        let registry = Registry::new(&func.params, &options)?;
        let program = rewrite(&func.body, registry)?;
        execute(&program, context)
    }

    #[test]
    fn test_inline_and_preamble() {
        let ctx = Context::new().with("$a", 2.0).with("$s", "hi");
        let text = build(
            "($a, $s) => { f($a, $s); }",
            GeneratorOptions::new().inline("$a"),
            &ctx,
        )
        .unwrap();
        assert_eq!(text, r#"const $s = "hi";f(2, $s);"#);
    }

    #[test]
    fn test_negative_operand_parens() {
        let ctx = Context::new().with("$n", -2.0);
        let text = build("($n) => { -$n; $n ** 2; }", GeneratorOptions::new().inline_all(), &ctx)
            .unwrap();
        assert_eq!(text, "-(-2);(-2) ** 2;");
    }

    #[test]
    fn test_loop_declares_binders() {
        let ctx = Context::new().with("$arr", Value::array(vec![1.0.into(), "b".into()]));
        let text = build(
            "($arr) => { for (const $x of $arr) { t.push($x); } }",
            GeneratorOptions::new().inline("$arr"),
            &ctx,
        )
        .unwrap();
        assert_eq!(text, r#"{let $x = 1;t.push($x);}{let $x = "b";t.push($x);}"#);
    }

    #[test]
    fn test_for_in_over_object() {
        let ctx = Context::new().with("$o", Value::object([("a", Value::Null), ("b", Value::Null)]));
        let text = build(
            "($o) => { for (const $k in $o) log($k); }",
            GeneratorOptions::new().inline_all(),
            &ctx,
        )
        .unwrap();
        assert_eq!(text, r#"{log("a");}{log("b");}"#);
    }

    #[test]
    fn test_break_and_continue_keep_braces_balanced() {
        let ctx = Context::new().with("$arr", Value::array(vec![0.0.into(), 1.0.into(), 2.0.into()]));
        let text = build(
            "($arr) => { $loop: for (const $i of $arr) { if ($i === 0) { continue $loop; } t.push($i); if ($i === 1) break $loop; } }",
            GeneratorOptions::new().inline_all(),
            &ctx,
        )
        .unwrap();
        assert_eq!(text, "{{}}{t.push(1);}");
    }

    #[test]
    fn test_missing_context() {
        let err = build("($a, $b) => { f($a, $b); }", GeneratorOptions::new(), &Context::new().with("$a", 1.0))
            .unwrap_err();
        assert!(matches!(err, StagingError::MissingContext { name } if name == "$b"));
    }

    #[test]
    fn test_not_callable() {
        let err = build(
            "($f) => { $f(); }",
            GeneratorOptions::new().inline_all(),
            &Context::new().with("$f", 3.0),
        )
        .unwrap_err();
        assert!(matches!(err, StagingError::NotCallable { name, found: "number", .. } if name == "$f"));
    }

    #[test]
    fn test_staged_call_appends_display_text() {
        let ctx = Context::new().with(
            "$f",
            Value::native("f", |args| Ok(Value::string(format!("<{}>", args[0])))),
        );
        let text = build("($f) => { x($f([1, 2])); }", GeneratorOptions::new().inline_all(), &ctx)
            .unwrap();
        assert_eq!(text, "x(<1,2>);");
    }

    #[test]
    fn test_generation_time_error() {
        let err = build(
            "($a) => { if ($a.b.c) x(); }",
            GeneratorOptions::new().inline_all(),
            &Context::new().with("$a", Value::object([("b", Value::Null)])),
        )
        .unwrap_err();
        assert!(matches!(err, StagingError::Runtime(_)));
    }

    #[test]
    fn test_staged_construct_as_single_statement_body() {
        let source = "($c, $arr) => { if (x) if ($c) a(); n = 2; if (x) a(); else if ($c) b(); n = 3; while (x) for (const $i of $arr) f($i); n = 4; }";
        let ctx = Context::new().with("$c", false).with("$arr", Value::array(vec![]));
        let text = build(source, GeneratorOptions::new().inline_all(), &ctx).unwrap();
        assert_eq!(text, "if (x) {}n = 2;if (x) a(); else {}n = 3;while (x) {}n = 4;");

        let ctx = Context::new()
            .with("$c", true)
            .with("$arr", Value::array(vec![1.0.into()]));
        let text = build(source, GeneratorOptions::new().inline_all(), &ctx).unwrap();
        assert_eq!(
            text,
            "if (x) {a();}n = 2;if (x) a(); else {b();}n = 3;while (x) {{f(1);}}n = 4;"
        );
    }

    #[test]
    fn test_inlined_values_keep_their_position() {
        let ctx = Context::new()
            .with("$n", 2.0)
            .with("$o", Value::object([("a", Value::object([("b", Value::Number(1.0))]))]))
            .with("$r", Value::raw("{}"));
        let text = build(
            "($n, $o, $r, y) => { $n.toString(y); $o; $o.a; () => $o; -$n; f($o); $r; }",
            GeneratorOptions::new().inline_all().replace("$r"),
            &ctx,
        )
        .unwrap();
        assert_eq!(
            text,
            r#"(2).toString(y);({"a":{"b":1}});({"b":1});() => ({"a":{"b":1}});-2;f({"a":{"b":1}});{};"#
        );
    }
}
