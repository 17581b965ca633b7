//! 条件、集合迭代、标签与跳转

use super::Rewriter;
use crate::classify::is_decidable;
use crate::error::{StagingError, StagingResult};
use crate::program::Instruction;
use crate::registry::is_stage_name;
use stagecraft_syntax::ast::{Expr, Span, Stmt};
use stagecraft_syntax::printer::{
    expr_to_string, pattern_to_string, print_stmts, walk_stmt, Printer,
};

impl Rewriter {
    pub(super) fn rewrite_if(
        &mut self,
        stmt: &Stmt,
        test: &Expr,
        consequent: &Stmt,
        alternate: Option<&Stmt>,
        in_body: bool,
    ) -> StagingResult<()> {
        if !is_decidable(test, &self.registry) {
            return self.walk_plain(stmt);
        }
        // else-if 链要么整体分段，要么都不分段
        if let Some(Stmt::If { test: next, .. }) = alternate {
            if !is_decidable(next, &self.registry) {
                return Err(StagingError::StagingMismatch {
                    test: expr_to_string(next),
                    span: next.span.clone(),
                });
            }
        }

        tracing::trace!(test = %expr_to_string(test), "staged conditional");
        let then = self.rewrite_branch(consequent)?;
        let otherwise = match alternate {
            Some(alternate) => Some(self.rewrite_branch(alternate)?),
            None => None,
        };
        self.push_staged(
            Instruction::If {
                test: test.clone(),
                then,
                otherwise,
            },
            in_body,
        );
        Ok(())
    }

    pub(super) fn rewrite_labeled(
        &mut self,
        stmt: &Stmt,
        label: &str,
        body: &Stmt,
        span: &Span,
        in_body: bool,
    ) -> StagingResult<()> {
        if !is_stage_name(label) {
            return self.walk_plain(stmt);
        }
        match body {
            Stmt::ForEach { source, .. } if is_decidable(source, &self.registry) => {
                self.rewrite_for_each(body, Some(label), in_body)
            }
            _ => Err(StagingError::InvalidLabel {
                label: label.to_string(),
                reason: "it does not annotate a `for ... of` or `for ... in` over a staged collection",
                span: span.clone(),
            }),
        }
    }

    pub(super) fn rewrite_for_each(
        &mut self,
        stmt: &Stmt,
        label: Option<&str>,
        in_body: bool,
    ) -> StagingResult<()> {
        let Stmt::ForEach {
            kind,
            binding,
            source,
            body,
            span,
        } = stmt
        else {
            return self.walk_plain(stmt);
        };
        if !is_decidable(source, &self.registry) {
            return self.walk_plain(stmt);
        }

        let names = binding.pattern.bound_names();
        if names.iter().any(|name| !is_stage_name(name)) {
            return Err(StagingError::NamingViolation {
                binding: pattern_to_string(&binding.pattern),
                span: span.clone(),
            });
        }

        tracing::trace!(source = %expr_to_string(source), binders = ?names, "unrolling staged loop");
        let scope = self.registry.bind(&names);
        let declare = names
            .iter()
            .filter(|name| !self.registry.is_inlined(name))
            .cloned()
            .collect();
        if let Some(label) = label {
            self.labels.push((label.to_string(), self.plain_depth));
        }
        self.staged_loops.push(self.plain_loops);
        // 每次迭代的花括号由执行器输出
        let result = match &**body {
            Stmt::Block { body, .. } => self.capture(|r| print_stmts(r, body)),
            other => self.capture(|r| r.print_stmt(other)),
        };
        self.staged_loops.pop();
        if label.is_some() {
            self.labels.pop();
        }
        // 先释放绑定，再传播错误
        self.registry.unbind(scope);

        self.push_staged(
            Instruction::Each {
                label: label.map(str::to_string),
                kind: *kind,
                pattern: binding.pattern.clone(),
                source: source.clone(),
                declare,
                body: result?,
            },
            in_body,
        );
        Ok(())
    }

    pub(super) fn rewrite_jump(
        &mut self,
        stmt: &Stmt,
        label: Option<&str>,
        span: &Span,
        is_break: bool,
    ) -> StagingResult<()> {
        let Some(label) = label.filter(|label| is_stage_name(label)) else {
            // 最近的循环是分段循环时，不带标签的跳转没有目标
            if label.is_none() && self.staged_loops.last() == Some(&self.plain_loops) {
                return Err(StagingError::UnlabeledJump {
                    keyword: if is_break { "break" } else { "continue" },
                    span: span.clone(),
                });
            }
            return walk_stmt(self, stmt);
        };
        let depth = self
            .labels
            .iter()
            .rev()
            .find(|(l, _)| l == label)
            .map(|(_, depth)| *depth);
        match depth {
            None => {
                return Err(StagingError::InvalidLabel {
                    label: label.to_string(),
                    reason: "no enclosing staged loop carries this label",
                    span: span.clone(),
                })
            }
            Some(depth) if depth != self.plain_depth => {
                return Err(StagingError::InvalidLabel {
                    label: label.to_string(),
                    reason: "a staged jump may only be nested in staged constructs",
                    span: span.clone(),
                })
            }
            Some(_) => {}
        }
        let instr = if is_break {
            Instruction::Break(label.to_string())
        } else {
            Instruction::Continue(label.to_string())
        };
        self.buffer.push_dynamic(instr);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::error::StagingError;
    use crate::options::GeneratorOptions;
    use crate::program::Instruction;
    use crate::registry::Registry;
    use crate::rewrite::rewrite;
    use crate::StagingResult;
    use crate::GeneratorProgram;
    use stagecraft_syntax::parse_function;

    fn try_program(source: &str, options: GeneratorOptions) -> StagingResult<GeneratorProgram> {
        let func = parse_function(source).unwrap();
        let registry = Registry::new(&func.params, &options)?;
        rewrite(&func.body, registry)
    }

    #[test]
    fn test_staged_if_chain() {
        let program = try_program(
            "($c) => { if ($c === 0) a(); else if ($c === 1) b(); else c(); }",
            GeneratorOptions::new().inline_all(),
        )
        .unwrap();
        assert_eq!(program.instructions.len(), 1);
        match &program.instructions[0] {
            Instruction::If {
                then, otherwise, ..
            } => {
                assert_eq!(then, &vec![Instruction::Literal("a();".to_string())]);
                let otherwise = otherwise.as_ref().unwrap();
                assert!(matches!(&otherwise[0], Instruction::If { otherwise: Some(_), .. }));
            }
            other => panic!("Expected staged if, got {:?}", other),
        }
    }

    #[test]
    fn test_mixed_if_chain_is_rejected() {
        let err = try_program(
            "($c) => { if ($c === 0) a(); else if (x === 1) b(); }",
            GeneratorOptions::new(),
        )
        .unwrap_err();
        assert!(matches!(err, StagingError::StagingMismatch { test, .. } if test == "x === 1"));

        // 外层不分段时内层随意
        assert!(try_program(
            "($c) => { if (x) a(); else if ($c) b(); }",
            GeneratorOptions::new()
        )
        .is_ok());
    }

    #[test]
    fn test_staged_loop_listing() {
        let program = try_program(
            "($arr) => { for (const $item of $arr) f($item); }",
            GeneratorOptions::new().inline("$arr"),
        )
        .unwrap();
        assert_eq!(
            program.instructions[0].to_string(),
            r#"for (const $item of $arr) {result += "f($item);";}"#
        );
        match &program.instructions[0] {
            Instruction::Each { declare, .. } => assert_eq!(declare, &vec!["$item".to_string()]),
            other => panic!("Expected staged loop, got {:?}", other),
        }
    }

    #[test]
    fn test_inline_all_inlines_binders() {
        let program = try_program(
            "($arr) => { for (const [$k, $v] of $arr) f($k, $v); }",
            GeneratorOptions::new().inline_all(),
        )
        .unwrap();
        match &program.instructions[0] {
            Instruction::Each { declare, body, .. } => {
                assert!(declare.is_empty());
                assert_eq!(body.len(), 5);
            }
            other => panic!("Expected staged loop, got {:?}", other),
        }
    }

    #[test]
    fn test_loop_binder_naming() {
        let err = try_program(
            "($arr) => { for (const [$k, v] of $arr) f(v); }",
            GeneratorOptions::new(),
        )
        .unwrap_err();
        assert!(matches!(err, StagingError::NamingViolation { binding, .. } if binding == "[$k, v]"));
    }

    #[test]
    fn test_plain_loop_is_untouched() {
        let program = try_program(
            "($arr) => { for (const item of list) f(item); }",
            GeneratorOptions::new().inline_all(),
        )
        .unwrap();
        assert_eq!(
            program.instructions,
            vec![Instruction::Literal("for (const item of list) f(item);".to_string())]
        );
    }

    #[test]
    fn test_labels() {
        let program = try_program(
            "($arr) => { $l: for (const $i of $arr) { if ($i) continue $l; break $l; } plain: while (x) break plain; }",
            GeneratorOptions::new().inline_all(),
        )
        .unwrap();
        let listing: Vec<String> = program.instructions.iter().map(|i| i.to_string()).collect();
        assert_eq!(
            listing,
            vec![
                "$l: for (const $i of $arr) {if ($i) {continue $l;}break $l;}",
                r#"result += "plain: while (x) break plain;";"#,
            ]
        );
    }

    #[test]
    fn test_invalid_labels() {
        let err = try_program(
            "($arr) => { $l: while (x) {} }",
            GeneratorOptions::new(),
        )
        .unwrap_err();
        assert!(matches!(err, StagingError::InvalidLabel { label, .. } if label == "$l"));

        let err = try_program(
            "($arr) => { $l: for (const $i of list) {} }",
            GeneratorOptions::new(),
        )
        .unwrap_err();
        assert!(matches!(err, StagingError::InvalidLabel { .. }));

        let err = try_program(
            "($arr) => { for (const $i of $arr) { break $other; } }",
            GeneratorOptions::new(),
        )
        .unwrap_err();
        assert!(matches!(err, StagingError::InvalidLabel { label, .. } if label == "$other"));

        // 原样打印的 if 里不能跳出分段循环
        let err = try_program(
            "($arr) => { $l: for (const $i of $arr) { if (x) { break $l; } } }",
            GeneratorOptions::new(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            StagingError::InvalidLabel { reason, .. } if reason.contains("nested")
        ));
    }

    #[test]
    fn test_staged_branch_block() {
        let program = try_program(
            "($c) => { if ($c) { a(); } }",
            GeneratorOptions::new().inline_all(),
        )
        .unwrap();
        assert_eq!(
            program.instructions[0].to_string(),
            r#"if ($c) {result += "{";result += "a();";result += "}";}"#
        );
    }

    #[test]
    fn test_registry_restored_after_body_error() {
        let func = parse_function(
            "($arr) => { for (const $i of $arr) { if ($i) a(); else if (y) b(); } }",
        )
        .unwrap();
        let registry = Registry::new(&func.params, &GeneratorOptions::new()).unwrap();
        let before = registry.clone();
        let mut rewriter = crate::rewrite::Rewriter::new(registry);
        let result = stagecraft_syntax::printer::print_stmts(&mut rewriter, &func.body);
        assert!(matches!(result, Err(StagingError::StagingMismatch { .. })));
        assert_eq!(rewriter.registry(), &before);
    }

    #[test]
    fn test_unlabeled_jump_in_staged_loop() {
        let err = try_program(
            "($arr) => { for (const $i of $arr) { if ($i) break; } }",
            GeneratorOptions::new().inline_all(),
        )
        .unwrap_err();
        assert!(matches!(err, StagingError::UnlabeledJump { keyword: "break", .. }));

        let err = try_program(
            "($arr) => { while (x) { for (const $i of $arr) continue; } }",
            GeneratorOptions::new(),
        )
        .unwrap_err();
        assert!(matches!(err, StagingError::UnlabeledJump { keyword: "continue", .. }));

        // 跳转的目标是分段循环里面的运行期循环
        assert!(try_program(
            "($arr) => { for (const $i of $arr) { while (x) { if (y) break; continue; } } }",
            GeneratorOptions::new(),
        )
        .is_ok());
    }
}
