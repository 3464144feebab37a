use serde::Serialize;

use crate::source_map::Range;

pub const W_CALLOUT_UNCLOSED: &str = "W_CALLOUT_UNCLOSED";
pub const W_TOC_TRAILING: &str = "W_TOC_TRAILING";
pub const W_HEADING_SKIP: &str = "W_HEADING_SKIP";

/// A non-fatal report about input the engine rendered through a fallback path.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Diagnostic {
    pub range: Range,
    pub severity: DiagnosticSeverity,
    pub code: &'static str,
    pub message: String,
}

impl Diagnostic {
    pub fn new(
        range: Range,
        severity: DiagnosticSeverity,
        code: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            range,
            severity,
            code,
            message: message.into(),
        }
    }

    pub fn warning(range: Range, code: &'static str, message: impl Into<String>) -> Self {
        Self::new(range, DiagnosticSeverity::Warning, code, message)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    Error,
    Warning,
}
