//! Staging Error Types
//!
//! 所有错误都在构造、改写或生成期间同步抛出，不做任何恢复：
//! 一个错误中止整次生成。

use stagecraft_diagnostics::Diagnostic;
use stagecraft_runtime::RuntimeError;
use stagecraft_syntax::ast::Span;
use stagecraft_syntax::SyntaxError;
use thiserror::Error;

pub type StagingResult<T> = Result<T, StagingError>;

#[derive(Debug, Clone, Error)]
pub enum StagingError {
    // ============ 构造期错误 ============
    /// 参数不是简单名字 (解构、默认值、剩余参数)
    #[error("parameter `{param}` is not a simple name")]
    UnsupportedParameter { param: String, span: Span },

    /// inline / replace 选项指向了不存在的分段参数
    #[error("option names `{name}`, which is not a staged parameter")]
    UndeclaredOption { name: String },

    // ============ 改写期错误 ============
    /// 分段 if 的 else-if 分支不可在生成期判定
    #[error("else-if under a staged conditional must also be staged (condition: {test})")]
    StagingMismatch { test: String, span: Span },

    /// `$` 标签没有标注分段集合迭代，或者 break/continue 找不到这样的标签
    #[error("invalid staged label `{label}`: {reason}")]
    InvalidLabel {
        label: String,
        reason: &'static str,
        span: Span,
    },

    /// 分段循环里不带标签的 break/continue：展开后会落到运行期的外层循环上
    #[error("unlabeled `{keyword}` inside a staged loop")]
    UnlabeledJump { keyword: &'static str, span: Span },

    /// 分段循环引入了不带 `$` 前缀的绑定
    #[error("all staged loop binders must start with `$` (binding: {binding})")]
    NamingViolation { binding: String, span: Span },

    /// 内联访问链的计算键引用了运行期变量
    #[error("inlined property chain `{chain}` has a key that is only known at run time")]
    UnresolvedChain { chain: String, span: Span },

    // ============ 生成期错误 ============
    /// 上下文缺少分段参数的值
    #[error("no value supplied for staged parameter `{name}`")]
    MissingContext { name: String },

    /// 分段调用的目标不是函数
    #[error("staged callee `{name}` is {found}, not a function")]
    NotCallable {
        name: String,
        found: &'static str,
        span: Span,
    },

    // ============ 协作组件错误 ============
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error("{0}")]
    Runtime(#[from] RuntimeError),
}

impl StagingError {
    /// 源码位置 (相对于生成器的函数源码)
    pub fn span(&self) -> Option<Span> {
        match self {
            StagingError::UnsupportedParameter { span, .. }
            | StagingError::StagingMismatch { span, .. }
            | StagingError::InvalidLabel { span, .. }
            | StagingError::UnlabeledJump { span, .. }
            | StagingError::NamingViolation { span, .. }
            | StagingError::UnresolvedChain { span, .. }
            | StagingError::NotCallable { span, .. } => Some(span.clone()),
            StagingError::Syntax(err) => Some(err.span()),
            StagingError::UndeclaredOption { .. }
            | StagingError::MissingContext { .. }
            | StagingError::Runtime(_) => None,
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(self.to_string()).maybe_span(self.span());
        match self {
            StagingError::UnsupportedParameter { .. } => {
                diag.suggest("declare the parameter as a plain identifier")
            }
            StagingError::UndeclaredOption { name } => diag.with_note(format!(
                "`{}` must appear in the function's parameter list",
                name
            )),
            StagingError::StagingMismatch { .. } => diag.with_note(
                "a conditional chain is either resolved entirely during generation or not at all",
            ),
            StagingError::InvalidLabel { .. } => diag.with_note(
                "`$` labels may only annotate `for ... of` / `for ... in` over a staged collection",
            ),
            StagingError::UnlabeledJump { .. } => diag
                .with_note("a staged loop is unrolled; it is not a loop in the produced program")
                .suggest("label the staged loop with a `$` label and jump to that label"),
            StagingError::NamingViolation { .. } => {
                diag.suggest("prefix every name bound by the loop with `$`")
            }
            StagingError::UnresolvedChain { .. } => {
                diag.suggest("compute the key from staged values only, or do not inline the root")
            }
            StagingError::MissingContext { name } => {
                diag.suggest(format!("add a value for `{}` to the context", name))
            }
            StagingError::NotCallable { .. } => {
                diag.with_note("calls through a staged name run during generation")
            }
            StagingError::Syntax(_) => diag,
            StagingError::Runtime(_) => {
                diag.with_note("raised while evaluating a staged expression")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = StagingError::MissingContext { name: "$x".into() };
        assert_eq!(err.to_string(), "no value supplied for staged parameter `$x`");

        let err = StagingError::InvalidLabel {
            label: "$l".into(),
            reason: "not an enclosing staged loop",
            span: 0..2,
        };
        assert_eq!(
            err.to_string(),
            "invalid staged label `$l`: not an enclosing staged loop"
        );
    }

    #[test]
    fn test_to_diagnostic_carries_span() {
        let err = StagingError::NamingViolation {
            binding: "const [$a, b]".into(),
            span: 5..18,
        };
        let diag = err.to_diagnostic();
        assert!(diag.is_error());
        assert_eq!(diag.span, Some(5..18));
        assert_eq!(diag.suggestions.len(), 1);

        let diag = StagingError::UndeclaredOption { name: "$y".into() }.to_diagnostic();
        assert_eq!(diag.span, None);
        assert_eq!(diag.notes.len(), 1);
    }

    #[test]
    fn test_runtime_error_converts() {
        let err: StagingError = RuntimeError::Type("boom".into()).into();
        assert_eq!(err.to_string(), "boom");
        assert!(err.span().is_none());
    }
}
