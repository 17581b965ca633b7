//! Emitter - 诊断输出器
//!
//! 没有源码时输出 `error: message` 形式的文本；
//! 有源码时用 ariadne 渲染带标注的源码片段。

use crate::diagnostic::{Diagnostic, Span};
use crate::level::DiagnosticLevel;
use ariadne::{Color, Config, Label, Report, ReportKind, Source};
use colored::*;

pub struct Emitter {
    use_colors: bool,
}

impl Default for Emitter {
    fn default() -> Self {
        Self::new()
    }
}

impl Emitter {
    pub fn new() -> Self {
        Self { use_colors: true }
    }

    pub fn without_colors() -> Self {
        Self { use_colors: false }
    }

    /// 不带源码的文本形式
    pub fn render(&self, diagnostic: &Diagnostic) -> String {
        let mut out = String::new();
        if self.use_colors {
            out.push_str(&format!(
                "{}: {}\n",
                diagnostic.level.colored_name(),
                diagnostic.message.bold()
            ));
            if let Some(span) = &diagnostic.span {
                out.push_str(&format!("  {} {}..{}\n", "-->".blue().bold(), span.start, span.end));
            }
            for note in &diagnostic.notes {
                out.push_str(&format!(
                    "  {} {}\n",
                    "=".blue().bold(),
                    format!("note: {}", note).bright_black()
                ));
            }
            for suggestion in &diagnostic.suggestions {
                out.push_str(&format!(
                    "  {} {}\n",
                    "=".green().bold(),
                    format!("help: {}", suggestion.message).green()
                ));
            }
        } else {
            out.push_str(&format!("{}: {}\n", diagnostic.level, diagnostic.message));
            if let Some(span) = &diagnostic.span {
                out.push_str(&format!("  --> {}..{}\n", span.start, span.end));
            }
            for note in &diagnostic.notes {
                out.push_str(&format!("  = note: {}\n", note));
            }
            for suggestion in &diagnostic.suggestions {
                out.push_str(&format!("  = help: {}\n", suggestion.message));
            }
        }
        out
    }

    /// 带源码片段的报告；没有位置信息时退回 `render`
    pub fn render_with_source(&self, diagnostic: &Diagnostic, source: &str) -> String {
        let Some(span) = diagnostic.span.clone() else {
            return self.render(diagnostic);
        };
        let span = clamp(span, source.len());

        let kind = match diagnostic.level {
            DiagnosticLevel::Error => ReportKind::Error,
            DiagnosticLevel::Warning => ReportKind::Warning,
        };
        let color = match diagnostic.level {
            DiagnosticLevel::Error => Color::Red,
            DiagnosticLevel::Warning => Color::Yellow,
        };

        let mut builder = Report::<Span>::build(kind, (), span.start)
            .with_config(Config::default().with_color(self.use_colors))
            .with_message(&diagnostic.message)
            .with_label(
                Label::new(span)
                    .with_message(&diagnostic.message)
                    .with_color(color),
            );
        // ariadne 0.4 每个报告只保留一条 note / help
        if !diagnostic.notes.is_empty() {
            builder = builder.with_note(diagnostic.notes.join("\n"));
        }
        if !diagnostic.suggestions.is_empty() {
            let help: Vec<&str> = diagnostic
                .suggestions
                .iter()
                .map(|s| s.message.as_str())
                .collect();
            builder = builder.with_help(help.join("\n"));
        }

        let mut buf = Vec::new();
        match builder.finish().write(Source::from(source), &mut buf) {
            Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
            Err(_) => self.render(diagnostic),
        }
    }

    /// 输出到标准错误
    pub fn emit(&self, diagnostic: &Diagnostic) {
        eprint!("{}", self.render(diagnostic));
    }

    pub fn emit_with_source(&self, diagnostic: &Diagnostic, source: &str) {
        eprint!("{}", self.render_with_source(diagnostic, source));
    }
}

// 报告位置必须落在源码内
fn clamp(span: Span, len: usize) -> Span {
    let start = span.start.min(len);
    let end = span.end.clamp(start, len);
    start..end
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emitter_creation() {
        assert!(Emitter::new().use_colors);
        assert!(!Emitter::without_colors().use_colors);
    }

    #[test]
    fn test_render_plain() {
        let diag = Diagnostic::error("missing context value for `$x`")
            .with_note("every staged parameter needs a value")
            .suggest("pass `--set $x=...`");
        let text = Emitter::without_colors().render(&diag);
        assert_eq!(
            text,
            "error: missing context value for `$x`\n  = note: every staged parameter needs a value\n  = help: pass `--set $x=...`\n"
        );
    }

    #[test]
    fn test_render_with_source_mentions_message() {
        let source = "($a) => { $b: while (x) {} }";
        let diag = Diagnostic::error("invalid staged label").span(10..12);
        let report = Emitter::without_colors().render_with_source(&diag, source);
        assert!(report.contains("invalid staged label"));
        assert!(report.contains("while (x)"));
    }

    #[test]
    fn test_render_with_source_without_span_falls_back() {
        let diag = Diagnostic::error("no span");
        let report = Emitter::without_colors().render_with_source(&diag, "x");
        assert_eq!(report, "error: no span\n");
    }

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(5..20, 10), 5..10);
        assert_eq!(clamp(15..20, 10), 10..10);
    }
}
