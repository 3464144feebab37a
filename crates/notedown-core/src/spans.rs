//! Inline span extensions: `==highlight==`, `{c:value}colored{/c}` and `{h}hidden{/h}`.
//! All three take the first valid closing delimiter.

use tracing::trace;

use crate::emit::HtmlRenderer;
use crate::lexer::Lexer;
use crate::span::Span;
use crate::token::{Inline, InlineKind, InlineSeq};

const HIGHLIGHT_MARKER: u8 = b'=';
const COLOR_OPEN: &str = "{c:";
const COLOR_CLOSE: &str = "{/c}";
const HIDDEN_OPEN: &str = "{h}";
const HIDDEN_CLOSE: &str = "{/h}";

pub(crate) fn probe_highlight(src: &str) -> Option<usize> {
    src.find("==")
}

pub(crate) fn probe_color(src: &str) -> Option<usize> {
    src.find(COLOR_OPEN)
}

pub(crate) fn probe_hidden(src: &str) -> Option<usize> {
    src.find(HIDDEN_OPEN)
}

/// The opening run is the full marker run at the cursor (two or more). The closing run
/// is the first later run of exactly the same length, so content never ends in a marker
/// and the closer is never followed by one.
pub(crate) fn tokenize_highlight(
    lexer: &mut Lexer<'_>,
    src: &str,
    base: usize,
) -> Option<(Inline, usize)> {
    let bytes = src.as_bytes();
    let open = marker_run(bytes, 0);
    if open < 2 {
        return None;
    }
    let mut i = open;
    while i < bytes.len() {
        if bytes[i] != HIGHLIGHT_MARKER {
            i += 1;
            continue;
        }
        let run = marker_run(bytes, i);
        if run == open {
            let children = lexer.inline_tokens(&src[open..i], base + open);
            let consumed = i + run;
            trace!(consumed, "highlight");
            return Some((
                Inline::new(Span::at(base, consumed), InlineKind::Highlight(children)),
                consumed,
            ));
        }
        i += run;
    }
    None
}

pub(crate) fn tokenize_color(
    lexer: &mut Lexer<'_>,
    src: &str,
    base: usize,
) -> Option<(Inline, usize)> {
    let rest = src.strip_prefix(COLOR_OPEN)?;
    let value_len = rest.find('}')?;
    let value = &rest[..value_len];
    if value.is_empty() || value.chars().any(char::is_whitespace) {
        return None;
    }
    let content_start = COLOR_OPEN.len() + value_len + 1;
    let content_len = src[content_start..].find(COLOR_CLOSE)?;
    let children = lexer.inline_tokens(
        &src[content_start..content_start + content_len],
        base + content_start,
    );
    let consumed = content_start + content_len + COLOR_CLOSE.len();
    trace!(consumed, value, "colored text");
    Some((
        Inline::new(
            Span::at(base, consumed),
            InlineKind::Color {
                value: value.to_string(),
                children,
            },
        ),
        consumed,
    ))
}

pub(crate) fn tokenize_hidden(
    lexer: &mut Lexer<'_>,
    src: &str,
    base: usize,
) -> Option<(Inline, usize)> {
    let rest = src.strip_prefix(HIDDEN_OPEN)?;
    let content_len = rest.find(HIDDEN_CLOSE)?;
    let content_start = HIDDEN_OPEN.len();
    let children = lexer.inline_tokens(&rest[..content_len], base + content_start);
    let consumed = content_start + content_len + HIDDEN_CLOSE.len();
    trace!(consumed, "hidden text");
    Some((
        Inline::new(Span::at(base, consumed), InlineKind::Hidden(children)),
        consumed,
    ))
}

pub(crate) fn render_highlight(children: &InlineSeq, html: &mut HtmlRenderer<'_>) -> String {
    format!("<mark class=\"highlight\">{}</mark>", html.inlines(children))
}

/// The color value is written verbatim into the style attribute.
pub(crate) fn render_color(value: &str, children: &InlineSeq, html: &mut HtmlRenderer<'_>) -> String {
    format!(
        "<span class=\"colored\" style=\"color: {}\">{}</span>",
        value,
        html.inlines(children)
    )
}

pub(crate) fn render_hidden(children: &InlineSeq, html: &mut HtmlRenderer<'_>) -> String {
    format!("<span class=\"hidden\">{}</span>", html.inlines(children))
}

fn marker_run(bytes: &[u8], start: usize) -> usize {
    bytes[start..]
        .iter()
        .take_while(|byte| **byte == HIGHLIGHT_MARKER)
        .count()
}

#[cfg(test)]
mod tests {
    use crate::engine::Engine;
    use crate::extension::Extension;
    use crate::token::{Inline, InlineKind, plain_text};

    fn engine() -> Engine {
        let mut engine = Engine::new();
        engine.use_extensions(Extension::defaults().expect("defaults"));
        engine
    }

    fn highlights(inlines: &[Inline]) -> Vec<String> {
        inlines
            .iter()
            .filter_map(|inline| match &inline.kind {
                InlineKind::Highlight(children) => Some(plain_text(children)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn highlight_scanning_resumes_after_first_span() {
        let inlines = engine().tokenize_inline("a==b==c==d==e");
        assert_eq!(highlights(&inlines), ["b", "d"]);
        let texts: Vec<_> = inlines
            .iter()
            .filter_map(|inline| match &inline.kind {
                InlineKind::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(texts, ["a", "c", "e"]);
    }

    #[test]
    fn highlight_closer_must_match_run_length() {
        let inlines = engine().tokenize_inline("===x==y===");
        assert_eq!(highlights(&inlines), ["x==y"]);
    }

    #[test]
    fn highlight_closer_not_followed_by_marker() {
        let inlines = engine().tokenize_inline("==a===b==");
        assert_eq!(highlights(&inlines), ["a===b"]);
    }

    #[test]
    fn unbalanced_highlight_is_plain_text() {
        let inlines = engine().tokenize_inline("x ==y");
        assert!(highlights(&inlines).is_empty());
        assert_eq!(plain_text(&inlines), "x ==y");
    }

    #[test]
    fn highlight_nests_other_inline_spans() {
        let inlines = engine().tokenize_inline("==a *b* {h}c{/h}==");
        let InlineKind::Highlight(children) = &inlines[0].kind else {
            panic!("expected highlight, got {:?}", inlines[0].kind);
        };
        assert!(children
            .iter()
            .any(|inline| matches!(inline.kind, InlineKind::Emph(_))));
        assert!(children
            .iter()
            .any(|inline| matches!(inline.kind, InlineKind::Hidden(_))));
    }

    #[test]
    fn color_keeps_value_uninterpreted() {
        let inlines = engine().tokenize_inline("{c:#ff0000}red{/c} tail");
        match &inlines[0].kind {
            InlineKind::Color { value, children } => {
                assert_eq!(value, "#ff0000");
                assert_eq!(plain_text(children), "red");
            }
            other => panic!("expected color, got {:?}", other),
        }
        assert_eq!(inlines[0].span.len(), "{c:#ff0000}red{/c}".len());
    }

    #[test]
    fn color_value_rejects_whitespace() {
        let inlines = engine().tokenize_inline("{c:dark red}x{/c}");
        assert_eq!(plain_text(&inlines), "{c:dark red}x{/c}");
    }

    #[test]
    fn color_first_closer_wins() {
        let inlines = engine().tokenize_inline("{c:red}a{c:blue}b{/c}c{/c}");
        let InlineKind::Color { children, .. } = &inlines[0].kind else {
            panic!("expected color");
        };
        assert_eq!(plain_text(children), "a{c:blue}b");
        assert_eq!(plain_text(&inlines[1..]), "c{/c}");
    }

    #[test]
    fn hidden_without_closer_falls_through() {
        let inlines = engine().tokenize_inline("{h}secret");
        assert_eq!(plain_text(&inlines), "{h}secret");
        let inlines = engine().tokenize_inline("{h}secret{/h}");
        assert!(matches!(inlines[0].kind, InlineKind::Hidden(_)));
    }
}
