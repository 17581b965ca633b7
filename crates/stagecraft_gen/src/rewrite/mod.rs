//! Tree Rewriter
//!
//! 在通用打印器的基础上覆盖少数节点：
//! 可在生成期判定的结构变成指令，其余原样打印成字面文本。
//! 每次编译创建一个新的 `Rewriter`，持有自己的 `Registry` 副本。

mod access;
mod control_flow;

use crate::buffer::OutputBuffer;
use crate::error::{StagingError, StagingResult};
use crate::program::{GeneratorProgram, Instruction};
use crate::registry::Registry;
use stagecraft_syntax::ast::{Expr, ExprKind, Stmt};
use stagecraft_syntax::printer::{print_stmts, walk_expr, walk_stmt, Precedence, Printer};

pub struct Rewriter {
    registry: Registry,
    buffer: OutputBuffer,
    /// 外层分段循环的标签，以及进入循环时的字面结构深度
    labels: Vec<(String, usize)>,
    /// 当前所在的原样打印的复合结构层数
    plain_depth: usize,
    /// 当前所在的原样打印的循环层数
    plain_loops: usize,
    /// 每个外层分段循环进入时的 `plain_loops`
    staged_loops: Vec<usize>,
    /// 下一条语句是原样打印的 if/else/循环/标签的单语句体
    in_body: bool,
    /// 还没有输出任何文本的语句开头
    at_start: bool,
}

/// 改写函数体，得到生成器程序
pub fn rewrite(body: &[Stmt], registry: Registry) -> StagingResult<GeneratorProgram> {
    let params: Vec<String> = registry.staged().map(str::to_string).collect();
    let mut rewriter = Rewriter::new(registry);

    // 前导声明：分段但不内联的参数
    let declared: Vec<String> = rewriter.registry.declared().map(str::to_string).collect();
    for name in declared {
        rewriter.write(&format!("const {} = ", name));
        rewriter.buffer.push_dynamic(Instruction::Inline {
            expr: Expr::ident(name, 0..0),
            min: Precedence::Lowest,
            at_start: false,
        });
        rewriter.write(";");
    }

    print_stmts(&mut rewriter, body)?;
    let instructions = rewriter.buffer.finish();
    tracing::debug!(
        params = params.len(),
        instructions = instructions.len(),
        "rewrote function body"
    );
    Ok(GeneratorProgram::new(params, instructions))
}

impl Rewriter {
    pub fn new(registry: Registry) -> Self {
        Self {
            registry,
            buffer: OutputBuffer::new(),
            labels: Vec::new(),
            plain_depth: 0,
            plain_loops: 0,
            staged_loops: Vec::new(),
            in_body: false,
            at_start: false,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// 原样打印一条语句
    fn walk_plain(&mut self, stmt: &Stmt) -> StagingResult<()> {
        let body_follows = matches!(
            stmt,
            Stmt::If { .. }
                | Stmt::For { .. }
                | Stmt::ForEach { .. }
                | Stmt::While { .. }
                | Stmt::Labeled { .. }
        );
        let is_loop = matches!(
            stmt,
            Stmt::For { .. } | Stmt::ForEach { .. } | Stmt::While { .. }
        );
        let in_body = std::mem::replace(&mut self.in_body, body_follows);
        self.plain_depth += 1;
        self.plain_loops += usize::from(is_loop);
        let result = walk_stmt(self, stmt);
        self.plain_loops -= usize::from(is_loop);
        self.plain_depth -= 1;
        self.in_body = in_body;
        result
    }

    /// 分段结构可能不输出任何文本；作为单语句体时用块包起来，
    /// 否则后面的语句会变成外层结构的体
    fn push_staged(&mut self, instr: Instruction, in_body: bool) {
        let instr = if in_body {
            Instruction::Block(vec![instr])
        } else {
            instr
        };
        self.buffer.push_dynamic(instr);
    }

    /// 分段结构的分支：块语句的花括号交给执行器
    fn rewrite_branch(&mut self, stmt: &Stmt) -> StagingResult<Vec<Instruction>> {
        match stmt {
            Stmt::Block { body, .. } => {
                let inner = self.capture(|r| print_stmts(r, body))?;
                Ok(vec![Instruction::Block(inner)])
            }
            _ => self.capture(|r| r.print_stmt(stmt)),
        }
    }

    /// 把一段改写输出到独立的缓冲区，返回合并后的指令
    fn capture(
        &mut self,
        f: impl FnOnce(&mut Self) -> StagingResult<()>,
    ) -> StagingResult<Vec<Instruction>> {
        let outer = std::mem::take(&mut self.buffer);
        let result = f(self);
        let inner = std::mem::replace(&mut self.buffer, outer);
        result.map(|()| inner.finish())
    }
}

impl Printer for Rewriter {
    type Error = StagingError;

    fn write(&mut self, text: &str) {
        if !text.is_empty() {
            // 箭头函数的表达式体和语句开头一样，`{` 会被读成块
            self.at_start = text == " => ";
        }
        self.buffer.push_static(text);
    }

    fn print_stmt(&mut self, stmt: &Stmt) -> StagingResult<()> {
        let in_body = std::mem::take(&mut self.in_body);
        let result = match stmt {
            Stmt::If {
                test,
                consequent,
                alternate,
                ..
            } => self.rewrite_if(stmt, test, consequent, alternate.as_deref(), in_body),
            Stmt::Labeled { label, body, span } => {
                self.rewrite_labeled(stmt, label, body, span, in_body)
            }
            Stmt::ForEach { .. } => self.rewrite_for_each(stmt, None, in_body),
            Stmt::Break { label, span } => self.rewrite_jump(stmt, label.as_deref(), span, true),
            Stmt::Continue { label, span } => {
                self.rewrite_jump(stmt, label.as_deref(), span, false)
            }
            Stmt::Expr { .. } => {
                self.at_start = true;
                self.walk_plain(stmt)
            }
            _ => self.walk_plain(stmt),
        };
        self.in_body = in_body;
        result
    }

    fn print_expr(&mut self, expr: &Expr, min: Precedence) -> StagingResult<()> {
        let in_body = std::mem::take(&mut self.in_body);
        let result = match &expr.kind {
            ExprKind::Ident(name) => self.rewrite_ident(expr, name, min),
            ExprKind::Member { .. } => self.rewrite_member(expr, min),
            ExprKind::Call {
                callee,
                args,
                optional,
            } => self.rewrite_call(expr, callee, args, *optional, min),
            _ => walk_expr(self, expr, min),
        };
        self.in_body = in_body;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::GeneratorOptions;
    use stagecraft_syntax::parse_function;

    fn program(source: &str, options: GeneratorOptions) -> GeneratorProgram {
        let func = parse_function(source).unwrap();
        let registry = Registry::new(&func.params, &options).unwrap();
        rewrite(&func.body, registry).unwrap()
    }

    #[test]
    fn test_plain_body_is_one_literal() {
        let program = program(
            "function some(target) { target.push(1); if (a) b(); else c(); }",
            GeneratorOptions::new(),
        );
        assert!(program.params.is_empty());
        assert_eq!(
            program.instructions,
            vec![Instruction::Literal(
                "target.push(1);if (a) b(); else c();".to_string()
            )]
        );
    }

    #[test]
    fn test_preamble_declares_non_inlined() {
        let program = program(
            "($a, $b, x) => { f($a, $b); }",
            GeneratorOptions::new().inline("$b"),
        );
        assert_eq!(program.params, vec!["$a", "$b"]);
        let listing: Vec<String> = program.instructions.iter().map(|i| i.to_string()).collect();
        assert_eq!(
            listing,
            vec![
                r#"result += "const $a = ";"#,
                "result += __inline($a);",
                r#"result += ";f($a, ";"#,
                "result += __inline($b);",
                r#"result += ");";"#,
            ]
        );
    }

    #[test]
    fn test_capture_restores_buffer_on_error() {
        let registry = Registry::default();
        let mut rewriter = Rewriter::new(registry);
        rewriter.write("outer");
        let result = rewriter.capture(|r| {
            r.write("inner");
            Err(StagingError::MissingContext { name: "$x".into() })
        });
        assert!(result.is_err());
        assert_eq!(
            rewriter.buffer.finish(),
            vec![Instruction::Literal("outer".to_string())]
        );
    }
}
