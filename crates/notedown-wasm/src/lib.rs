use notedown_core::{
    Diagnostic, DiagnosticSeverity, HeadingRecord, LiteralSlugger, Notedown, RenderContext,
    Rendered,
};
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RenderOptions {
    literal_slugs: Option<bool>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RenderResult {
    html: String,
    headings: Vec<JsHeading>,
    diagnostics: Vec<JsDiagnostic>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsHeading {
    level: u8,
    title: String,
    slug: String,
    counter: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsDiagnostic {
    code: String,
    message: String,
    severity: String,
    range: JsRange,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsRange {
    start_line: usize,
    start_col: usize,
    end_line: usize,
    end_col: usize,
}

/// A long-lived renderer for editors that re-render on every keystroke.
#[wasm_bindgen]
pub struct NotedownSession {
    inner: Notedown,
}

#[wasm_bindgen]
impl NotedownSession {
    #[wasm_bindgen(constructor)]
    pub fn new() -> NotedownSession {
        NotedownSession {
            inner: Notedown::new(),
        }
    }

    pub fn render(&mut self, source: &str) -> Result<JsValue, JsValue> {
        render_with(&mut self.inner, source)
    }
}

impl Default for NotedownSession {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
pub fn render_html(source: &str) -> Result<JsValue, JsValue> {
    render_html_with_options(source, JsValue::UNDEFINED)
}

#[wasm_bindgen]
pub fn render_html_with_options(source: &str, options: JsValue) -> Result<JsValue, JsValue> {
    let options = options_from_js(options)?;
    let mut session = if options.literal_slugs.unwrap_or(false) {
        Notedown::with_context(RenderContext::with_slugger(Box::new(LiteralSlugger)))
    } else {
        Notedown::new()
    };
    render_with(&mut session, source)
}

fn render_with(session: &mut Notedown, source: &str) -> Result<JsValue, JsValue> {
    let rendered = session
        .render(source)
        .map_err(|err| JsValue::from_str(&err.to_string()))?;
    serde_wasm_bindgen::to_value(&to_result(rendered))
        .map_err(|err| JsValue::from_str(&err.to_string()))
}

fn options_from_js(value: JsValue) -> Result<RenderOptions, JsValue> {
    if value.is_null() || value.is_undefined() {
        return Ok(RenderOptions::default());
    }
    serde_wasm_bindgen::from_value(value).map_err(|err| JsValue::from_str(&err.to_string()))
}

fn to_result(rendered: Rendered) -> RenderResult {
    RenderResult {
        html: rendered.html,
        headings: rendered.headings.iter().map(to_heading).collect(),
        diagnostics: rendered.diagnostics.into_iter().map(to_diagnostic).collect(),
    }
}

fn to_heading(record: &HeadingRecord) -> JsHeading {
    JsHeading {
        level: record.level,
        title: record.title.clone(),
        slug: record.slug.clone(),
        counter: record.counter.clone(),
    }
}

fn to_diagnostic(diag: Diagnostic) -> JsDiagnostic {
    JsDiagnostic {
        code: diag.code.to_string(),
        message: diag.message,
        severity: match diag.severity {
            DiagnosticSeverity::Error => "error".to_string(),
            DiagnosticSeverity::Warning => "warning".to_string(),
        },
        range: JsRange {
            start_line: diag.range.start.line,
            start_col: diag.range.start.character,
            end_line: diag.range.end.line,
            end_col: diag.range.end.character,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_carries_outline_and_diagnostics() {
        let rendered = notedown_core::render("# A\n## B\n\n{note}\nopen\n").expect("render");
        let result = to_result(rendered);
        let counters: Vec<_> = result.headings.iter().map(|h| h.counter.as_str()).collect();
        assert_eq!(counters, ["1", "1.1"]);
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].code, "W_CALLOUT_UNCLOSED");
        assert_eq!(result.diagnostics[0].severity, "warning");
        assert_eq!(result.diagnostics[0].range.start_line, 3);
    }
}
