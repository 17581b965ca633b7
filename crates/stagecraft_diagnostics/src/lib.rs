//! Stagecraft Diagnostics
//!
//! 把语法错误、执行错误和分段错误渲染成带源码片段的报告。
//!
//! - [`Diagnostic`] - 诊断信息主体
//! - [`DiagnosticLevel`] - 诊断级别
//! - [`Emitter`] - 纯文本/彩色输出，或借助 ariadne 标注源码
//!
//! ```rust
//! use stagecraft_diagnostics::{Diagnostic, Emitter};
//!
//! let source = "($x) => { for (const item of $x) {} }";
//! let diag = Diagnostic::error("loop binder must carry the `$` prefix")
//!     .span(20..24)
//!     .suggest("rename `item` to `$item`");
//! let report = Emitter::without_colors().render_with_source(&diag, source);
//! assert!(report.contains("loop binder"));
//! ```

pub mod diagnostic;
pub mod emitter;
pub mod level;

pub use diagnostic::{Diagnostic, Span, Suggestion};
pub use emitter::Emitter;
pub use level::DiagnosticLevel;
