use crate::span::Span;
use std::path::PathBuf;
use thiserror::Error;

/// Every way lowering, synthesis or configuration can fail.
///
/// None of these are recovered locally: the first error aborts the
/// compilation unit and no output is produced.
#[derive(Debug, Error)]
pub enum CompileError {
    /// The IR contains a construct outside the supported algebra.
    #[error("unsupported construct: {msg}")]
    Unsupported { msg: String, span: Span },

    /// A known-incomplete lowering rule was reached.
    #[error("not yet implemented: {feature}")]
    NotImplemented { feature: String, span: Span },

    /// The front end broke an invariant this back end relies on.
    #[error("structural mismatch: {msg}")]
    StructuralMismatch { msg: String, span: Span },

    #[error("malformed IR input: {msg}")]
    Input { msg: String },

    #[error("config error: {msg}")]
    Config { msg: String, path: Option<PathBuf> },
}

impl CompileError {
    pub fn unsupported(msg: impl Into<String>, span: Span) -> Self {
        Self::Unsupported { msg: msg.into(), span }
    }

    pub fn not_implemented(feature: impl Into<String>, span: Span) -> Self {
        Self::NotImplemented { feature: feature.into(), span }
    }

    pub fn mismatch(msg: impl Into<String>, span: Span) -> Self {
        Self::StructuralMismatch { msg: msg.into(), span }
    }

    pub fn input(msg: impl Into<String>) -> Self {
        Self::Input { msg: msg.into() }
    }

    pub fn config(msg: impl Into<String>, path: Option<PathBuf>) -> Self {
        Self::Config { msg: msg.into(), path }
    }

    /// Span of the offending IR node, if the error is tied to one.
    pub fn span(&self) -> Option<Span> {
        match self {
            CompileError::Unsupported { span, .. }
            | CompileError::NotImplemented { span, .. }
            | CompileError::StructuralMismatch { span, .. } => Some(*span),
            CompileError::Input { .. } | CompileError::Config { .. } => None,
        }
    }
}

impl From<serde_json::Error> for CompileError {
    fn from(e: serde_json::Error) -> Self {
        CompileError::input(e.to_string())
    }
}

/// Render a CompileError against the front end's source text.
///
/// Span-carrying errors get an ariadne report with the offending range
/// labelled; the rest render as a single `error: ...` line.
pub fn render_error(source: &str, err: &CompileError) -> String {
    use ariadne::{Config, Label, Report, ReportKind, Source};

    match err.span() {
        Some(span) if !span.is_dummy() => {
            let kind_str = match err {
                CompileError::Unsupported { .. } => "unsupported construct",
                CompileError::NotImplemented { .. } => "not yet implemented",
                CompileError::StructuralMismatch { .. } => "structural mismatch",
                _ => "error",
            };
            let mut buf = Vec::new();
            let written = Report::build(ReportKind::Error, (), span.start)
                .with_config(Config::default().with_color(false))
                .with_message(kind_str)
                .with_label(Label::new(span.start..span.end).with_message(err.to_string()))
                .finish()
                .write(Source::from(source), &mut buf);
            match written {
                Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
                Err(_) => format!("error: {err}"),
            }
        }
        _ => match err {
            CompileError::Config { msg, path: Some(path) } => {
                format!("error[config]: {msg}\n  --> {}", path.display())
            }
            _ => format!("error: {err}"),
        },
    }
}
