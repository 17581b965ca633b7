//! 标识符、访问链与调用

use super::Rewriter;
use crate::classify::{is_decidable, References};
use crate::error::{StagingError, StagingResult};
use crate::program::Instruction;
use crate::registry::is_stage_name;
use stagecraft_syntax::ast::{Expr, ExprKind, MemberProperty};
use stagecraft_syntax::printer::{
    expr_to_string, print_args, print_member_property, walk_expr, Precedence, Printer,
};

impl Rewriter {
    pub(super) fn rewrite_ident(
        &mut self,
        expr: &Expr,
        name: &str,
        min: Precedence,
    ) -> StagingResult<()> {
        if is_stage_name(name) && self.registry.is_inlined(name) {
            self.inline(expr, min)
        } else {
            walk_expr(self, expr, min)
        }
    }

    pub(super) fn rewrite_member(&mut self, expr: &Expr, min: Precedence) -> StagingResult<()> {
        // 原样插入的根由 rewrite_ident 替换，链的其余部分照常打印
        if self.inlined_root(expr) {
            self.check_chain_keys(expr)?;
            self.inline(expr, min)
        } else {
            walk_expr(self, expr, min)
        }
    }

    pub(super) fn rewrite_call(
        &mut self,
        expr: &Expr,
        callee: &Expr,
        args: &[Expr],
        optional: bool,
        min: Precedence,
    ) -> StagingResult<()> {
        // 分段调用：生成期执行，结果按显示文本追加
        if let Some(name) = callee.as_ident() {
            if is_stage_name(name) && self.registry.is_staged(name) {
                tracing::trace!(callee = name, "staged call");
                self.at_start = false;
                self.buffer.push_dynamic(Instruction::Call(expr.clone()));
                return Ok(());
            }
        }

        if is_decidable(expr, &self.registry) {
            if matches!(callee.kind, ExprKind::Member { .. }) {
                self.check_chain_keys(callee)?;
            }
            return self.inline(expr, min);
        }

        // 内联值上的方法调用：只内联对象部分，方法留到运行期
        if let ExprKind::Member {
            object,
            property,
            optional: member_optional,
        } = &callee.kind
        {
            if self.inlined_root(callee) {
                let parens = expr.precedence() < min;
                if parens {
                    self.write("(");
                }
                self.print_expr(object, Precedence::Call)?;
                print_member_property(self, property, *member_optional)?;
                if optional {
                    self.write("?.");
                }
                print_args(self, args)?;
                if parens {
                    self.write(")");
                }
                return Ok(());
            }
        }

        walk_expr(self, expr, min)
    }

    // 访问链的根是内联 (但不是原样插入) 的分段名字
    fn inlined_root(&self, chain: &Expr) -> bool {
        match chain.chain_root().as_ident() {
            Some(name) => {
                is_stage_name(name) && self.registry.is_inlined(name) && !self.registry.is_raw(name)
            }
            None => false,
        }
    }

    /// 内联的访问链整体在生成期求值，计算键只能引用分段名字
    fn check_chain_keys(&self, chain: &Expr) -> StagingResult<()> {
        let mut current = chain;
        while let ExprKind::Member {
            object, property, ..
        } = &current.kind
        {
            if let MemberProperty::Computed(key) = property {
                let names = References::collect(key);
                if names.iter().any(|name| !self.registry.is_staged(name)) {
                    return Err(StagingError::UnresolvedChain {
                        chain: expr_to_string(chain),
                        span: chain.span.clone(),
                    });
                }
            }
            current = object;
        }
        Ok(())
    }

    fn inline(&mut self, expr: &Expr, min: Precedence) -> StagingResult<()> {
        let at_start = std::mem::take(&mut self.at_start);
        self.buffer.push_dynamic(Instruction::Inline {
            expr: expr.clone(),
            min,
            at_start,
        });
        Ok(())
    }
}
