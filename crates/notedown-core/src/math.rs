//! Configuration for the client-side math typesetter. Math source is passed
//! through verbatim (`\( … \)` inline, `\[ … \]` display); the typesetter runs
//! once after the rendered markup is inserted.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

pub const DEFAULT_MATH_SCRIPT: &str = "https://cdn.jsdelivr.net/npm/mathjax@3/es5/tex-svg.js";

/// Invoked once the rendered body is in the page.
pub const TYPESET_TRIGGER: &str = "window.MathJax.typesetPromise();";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MathConfig {
    pub inline_delimiters: Vec<(String, String)>,
    pub display_delimiters: Vec<(String, String)>,
    /// Equation numbering style (`ams`, `all` or `none`).
    pub tags: String,
    pub process_escapes: bool,
    /// Tags removed from the typesetter's skip list, so math inside them is processed.
    pub unskip_tags: Vec<String>,
    pub process_classes: Vec<String>,
    pub typeset_on_startup: bool,
    pub script_url: String,
}

impl Default for MathConfig {
    fn default() -> Self {
        Self {
            inline_delimiters: delimiters(&[("$", "$"), ("\\(", "\\)")]),
            display_delimiters: delimiters(&[("$$", "$$"), ("\\[", "\\]")]),
            tags: "ams".to_string(),
            process_escapes: true,
            unskip_tags: vec!["pre".to_string()],
            process_classes: vec!["language-pseudo".to_string()],
            typeset_on_startup: false,
            script_url: DEFAULT_MATH_SCRIPT.to_string(),
        }
    }
}

impl MathConfig {
    /// The typesetter's global configuration object.
    pub fn engine_config(&self) -> Value {
        json!({
            "options": {
                "skipHtmlTags": { "[-]": self.unskip_tags },
                "processHtmlClass": self.process_classes.join("|"),
            },
            "tex": {
                "inlineMath": pairs(&self.inline_delimiters),
                "displayMath": pairs(&self.display_delimiters),
                "tags": self.tags,
                "processEscapes": self.process_escapes,
            },
            "startup": {
                "typeset": self.typeset_on_startup,
            },
        })
    }

    /// `window.MathJax = {…};`, to run before the typesetter script loads.
    pub fn config_script(&self) -> String {
        format!("window.MathJax = {};", self.engine_config())
    }
}

fn delimiters(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(open, close)| (open.to_string(), close.to_string()))
        .collect()
}

fn pairs(delimiters: &[(String, String)]) -> Vec<[&str; 2]> {
    delimiters
        .iter()
        .map(|(open, close)| [open.as_str(), close.as_str()])
        .collect()
}
