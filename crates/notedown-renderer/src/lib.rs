use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::sync::Mutex;

use lru::LruCache;
use notedown_core::{MathConfig, NotedownConfig, TYPESET_TRIGGER};
use once_cell::sync::Lazy;
use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme as SyntectTheme, ThemeSet};
use syntect::html::{IncludeBackground, styled_line_to_highlighted_html};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;
use tracing::{debug, trace};

pub use notedown_core::Theme;

const BASE_CSS: &str = include_str!("../assets/notedown.css");
const REVEAL_JS: &str = include_str!("../assets/reveal.js");
const MATH_BOOT_JS: &str = include_str!("../assets/math-boot.js");

const MATH_TIMEOUT_MS: u32 = 15_000;
const CODE_OPEN: &str = "<pre class=\"code\"><code class=\"language-";
const CODE_CLOSE: &str = "</code></pre>";

static SYNTAX_SET: Lazy<SyntaxSet> = Lazy::new(SyntaxSet::load_defaults_newlines);
static THEME_SET: Lazy<ThemeSet> = Lazy::new(ThemeSet::load_defaults);

type CacheKey = (Theme, String, String);
static HIGHLIGHT_CACHE: Lazy<Mutex<LruCache<CacheKey, String>>> = Lazy::new(|| {
    Mutex::new(LruCache::new(
        NonZeroUsize::new(128).unwrap_or(NonZeroUsize::MIN),
    ))
});

/// Page-level switches for [`Renderer::embed_html`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageOptions {
    pub inline_css: bool,
    pub reveal_script: bool,
    /// Math engine configuration; `None` leaves math as source text.
    pub math: Option<MathConfig>,
}

impl Default for PageOptions {
    fn default() -> Self {
        Self {
            inline_css: true,
            reveal_script: true,
            math: Some(MathConfig::default()),
        }
    }
}

impl PageOptions {
    pub fn from_config(config: &NotedownConfig) -> Self {
        Self {
            inline_css: config.page.inline_css,
            reveal_script: config.page.reveal_script,
            math: Some(config.math.clone()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Renderer {
    theme: Theme,
    custom_vars: BTreeMap<String, String>,
}

impl Renderer {
    pub fn new(theme: Theme) -> Self {
        Self {
            theme,
            custom_vars: BTreeMap::new(),
        }
    }

    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_vars.insert(key.into(), value.into());
        self
    }

    pub fn stylesheet(&self) -> String {
        let mut out = String::new();
        let (light_vars, dark_vars) = default_theme_vars();

        match self.theme {
            Theme::Auto => {
                out.push_str(&root_block(&light_vars, true));
                out.push_str("@media (prefers-color-scheme: dark) {\n");
                out.push_str(&indent_root_block(&dark_vars));
                out.push_str("}\n");
            }
            Theme::Light => {
                out.push_str(&root_block(&light_vars, true));
            }
            Theme::Dark => {
                out.push_str(&root_block(&dark_vars, true));
            }
        }

        if !self.custom_vars.is_empty() {
            out.push_str(&root_block(&self.custom_vars, false));
        }

        out.push_str(BASE_CSS);
        out
    }

    /// Wraps a rendered body in a full page: `<div class="rendered">` with the
    /// title block, then the optional reveal script and math bootstrap.
    pub fn embed_html(&self, body: &str, title: &str, options: &PageOptions) -> String {
        let title = escape_html_text(title);
        let mut out = String::new();
        out.push_str("<!DOCTYPE html>\n");
        out.push_str("<html lang=\"en\">\n");
        out.push_str("<head>\n");
        out.push_str("  <meta charset=\"utf-8\" />\n");
        out.push_str("  <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\" />\n");
        out.push_str(&format!("  <title>{}</title>\n", title));
        if options.inline_css {
            out.push_str("  <style>\n");
            out.push_str(&self.stylesheet());
            out.push_str("\n  </style>\n");
        }
        out.push_str("</head>\n");
        out.push_str("<body>\n");
        out.push_str("<div class=\"rendered\">\n");
        out.push_str(&format!("<div class=\"title\">{}</div>\n", title));
        out.push_str(body);
        if !body.ends_with('\n') {
            out.push('\n');
        }
        out.push_str("</div>\n");
        if options.reveal_script {
            out.push_str("  <script>\n");
            out.push_str(REVEAL_JS);
            out.push_str("\n  </script>\n");
        }
        if let Some(math) = &options.math {
            out.push_str("  <script>\n");
            out.push_str(&math.config_script());
            out.push_str("\n  </script>\n");
            out.push_str("  <script>\n");
            out.push_str(&math_bootstrap(math));
            out.push_str("\n  </script>\n");
        }
        out.push_str("</body>\n");
        out.push_str("</html>\n");
        out
    }

    /// Highlights every fenced code block with a language. Blocks in languages
    /// syntect does not know are left as they are.
    pub fn highlight_html(&self, html: &str) -> String {
        let Some(theme) = pick_theme(self.theme, &THEME_SET) else {
            debug!("no syntax theme available; skipping highlighting");
            return html.to_string();
        };

        let mut out = String::with_capacity(html.len());
        let mut rest = html;
        let mut blocks = 0usize;

        while let Some(start) = rest.find(CODE_OPEN) {
            out.push_str(&rest[..start]);
            let after_start = &rest[start..];
            let end = match after_start.find(CODE_CLOSE) {
                Some(index) => index + CODE_CLOSE.len(),
                None => {
                    out.push_str(after_start);
                    return out;
                }
            };
            let block = &after_start[..end];
            out.push_str(&self.highlight_block(block, theme).unwrap_or_else(|| {
                trace!("code block left unhighlighted");
                block.to_string()
            }));
            blocks += 1;
            rest = &after_start[end..];
        }

        out.push_str(rest);
        debug!(blocks, "highlighted code blocks");
        out
    }

    fn highlight_block(&self, block: &str, theme: &SyntectTheme) -> Option<String> {
        let lang_start = CODE_OPEN.len();
        let head = block.get(..block.len().checked_sub(CODE_CLOSE.len())?)?;
        let lang_end = lang_start + head.get(lang_start..)?.find('"')?;
        let lang = &head[lang_start..lang_end];
        let tag_end = lang_end + head[lang_end..].find('>')? + 1;
        let code = unescape_html_code(&head[tag_end..]);

        let syntax = SYNTAX_SET.find_syntax_by_token(lang)?;
        let key = (self.theme, lang.to_string(), code.clone());
        if let Some(cached) = HIGHLIGHT_CACHE
            .lock()
            .ok()
            .and_then(|mut cache| cache.get(&key).cloned())
        {
            return Some(cached);
        }

        let mut highlighter = HighlightLines::new(syntax, theme);
        let mut highlighted = String::with_capacity(code.len() * 2);
        for line in LinesWithEndings::from(&code) {
            let ranges = highlighter.highlight_line(line, &SYNTAX_SET).ok()?;
            let html = styled_line_to_highlighted_html(&ranges, IncludeBackground::No).ok()?;
            highlighted.push_str(&strip_font_weight(&html));
        }

        let mut out = String::with_capacity(block.len() + highlighted.len());
        out.push_str(&block[..tag_end]);
        out.push_str(&highlighted);
        out.push_str(CODE_CLOSE);
        if let Ok(mut cache) = HIGHLIGHT_CACHE.lock() {
            cache.put(key, out.clone());
        }
        Some(out)
    }
}

fn math_bootstrap(math: &MathConfig) -> String {
    let src = serde_json::to_string(&math.script_url).unwrap_or_else(|_| "\"\"".to_string());
    MATH_BOOT_JS
        .replace("__NOTEDOWN_MATH_TIMEOUT__", &MATH_TIMEOUT_MS.to_string())
        .replace("__NOTEDOWN_MATH_SRC__", &src)
        .replace("__NOTEDOWN_TYPESET__", TYPESET_TRIGGER)
}

fn default_theme_vars() -> (BTreeMap<String, String>, BTreeMap<String, String>) {
    let light = BTreeMap::from([
        ("--notedown-bg".to_string(), "#fbfbf8".to_string()),
        ("--notedown-fg".to_string(), "#1f2328".to_string()),
        ("--notedown-muted".to_string(), "#5f6b76".to_string()),
        ("--notedown-border".to_string(), "#d8dee4".to_string()),
        ("--notedown-accent".to_string(), "#2b6cb0".to_string()),
        ("--notedown-code-bg".to_string(), "#f4f6f8".to_string()),
        ("--notedown-code-fg".to_string(), "#1f2328".to_string()),
        ("--notedown-highlight".to_string(), "#fff3a3".to_string()),
        ("--notedown-note-bg".to_string(), "#eef5fc".to_string()),
        ("--notedown-note-border".to_string(), "#2b6cb0".to_string()),
        ("--notedown-def-bg".to_string(), "#f1f8ef".to_string()),
        ("--notedown-def-border".to_string(), "#3d8b37".to_string()),
        ("--notedown-warn-bg".to_string(), "#fdf3e7".to_string()),
        ("--notedown-warn-border".to_string(), "#c9711a".to_string()),
    ]);

    let dark = BTreeMap::from([
        ("--notedown-bg".to_string(), "#0e1116".to_string()),
        ("--notedown-fg".to_string(), "#e6edf3".to_string()),
        ("--notedown-muted".to_string(), "#9aa4af".to_string()),
        ("--notedown-border".to_string(), "#2a313b".to_string()),
        ("--notedown-accent".to_string(), "#63b3ed".to_string()),
        ("--notedown-code-bg".to_string(), "#202634".to_string()),
        ("--notedown-code-fg".to_string(), "#f0f6fc".to_string()),
        ("--notedown-highlight".to_string(), "#5c4d12".to_string()),
        ("--notedown-note-bg".to_string(), "#16243a".to_string()),
        ("--notedown-note-border".to_string(), "#63b3ed".to_string()),
        ("--notedown-def-bg".to_string(), "#162a1b".to_string()),
        ("--notedown-def-border".to_string(), "#6cc264".to_string()),
        ("--notedown-warn-bg".to_string(), "#33230f".to_string()),
        ("--notedown-warn-border".to_string(), "#f0a04b".to_string()),
    ]);

    (light, dark)
}

fn format_vars(vars: &BTreeMap<String, String>, indent: &str) -> String {
    let mut out = String::new();
    for (key, value) in vars {
        out.push_str(indent);
        out.push_str(key);
        out.push_str(": ");
        out.push_str(value);
        out.push_str(";\n");
    }
    out
}

fn root_block(vars: &BTreeMap<String, String>, include_color_scheme: bool) -> String {
    let mut out = String::new();
    out.push_str(":root {\n");
    if include_color_scheme {
        out.push_str("  color-scheme: light dark;\n");
    }
    out.push_str(&format_vars(vars, "  "));
    out.push_str("}\n");
    out
}

fn indent_root_block(vars: &BTreeMap<String, String>) -> String {
    let mut out = String::new();
    out.push_str("  :root {\n");
    out.push_str("    color-scheme: light dark;\n");
    out.push_str(&format_vars(vars, "    "));
    out.push_str("  }\n");
    out
}

fn pick_theme(theme: Theme, theme_set: &ThemeSet) -> Option<&SyntectTheme> {
    let candidates = match theme {
        Theme::Dark => ["Monokai Extended Bright", "Monokai Extended", "base16-ocean.dark"],
        Theme::Light | Theme::Auto => ["InspiredGitHub", "Solarized (light)", "base16-ocean.light"],
    };
    candidates
        .iter()
        .find_map(|name| theme_set.themes.get(*name))
        .or_else(|| theme_set.themes.values().next())
}

fn escape_html_text(text: &str) -> String {
    let mut out = String::new();
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

fn unescape_html_code(text: &str) -> String {
    let mut out = String::new();
    let mut rest = text;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        if let Some(stripped) = tail.strip_prefix("&amp;") {
            out.push('&');
            rest = stripped;
        } else if let Some(stripped) = tail.strip_prefix("&lt;") {
            out.push('<');
            rest = stripped;
        } else if let Some(stripped) = tail.strip_prefix("&gt;") {
            out.push('>');
            rest = stripped;
        } else if let Some(stripped) = tail.strip_prefix("&quot;") {
            out.push('"');
            rest = stripped;
        } else {
            out.push('&');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    out
}

fn strip_font_weight(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut rest = html;
    while let Some(pos) = rest.find("font-weight:") {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos + "font-weight:".len()..];
        let end = match tail.find(';') {
            Some(index) => index + 1,
            None => {
                rest = "";
                break;
            }
        };
        rest = &tail[end..];
    }
    out.push_str(rest);
    out
}
