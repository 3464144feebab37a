//! Inline tokenizer. Extensions are tried at every cursor position in
//! registration order before the base rules; plain text runs stop at the next
//! special character or the next position an extension probe reports.

use crate::extension::Level;
use crate::lexer::Lexer;
use crate::span::Span;
use crate::token::{Inline, InlineKind, InlineSeq};

const SPECIAL: &[char] = &['\\', '`', '$', '!', '[', '<', '*', '_', '~', '\n'];

#[derive(Default)]
struct TextRun {
    text: String,
    start: usize,
}

impl TextRun {
    fn push(&mut self, text: &str, at: usize) {
        if self.text.is_empty() {
            self.start = at;
        }
        self.text.push_str(text);
    }

    /// Drops trailing spaces before a line break; two or more make the break hard.
    fn take_line_end(&mut self) -> bool {
        let trimmed = self.text.trim_end_matches(' ').len();
        let spaces = self.text.len() - trimmed;
        self.text.truncate(trimmed);
        spaces >= 2
    }

    fn flush(&mut self, out: &mut InlineSeq) {
        if self.text.is_empty() {
            return;
        }
        let text = std::mem::take(&mut self.text);
        out.push(Inline::text(Span::at(self.start, text.len()), text));
    }
}

impl Lexer<'_> {
    pub(crate) fn inline_tokens(&mut self, text: &str, base: usize) -> InlineSeq {
        let mut out = Vec::new();
        let mut pending = TextRun::default();
        let mut pos = 0;

        while pos < text.len() {
            let rest = &text[pos..];
            let at = base + pos;

            if let Some((inline, consumed)) = self.inline_extension(rest, at) {
                pending.flush(&mut out);
                out.push(inline);
                pos += consumed;
                continue;
            }

            if rest.starts_with('\n') {
                let hard = pending.take_line_end();
                pending.flush(&mut out);
                let kind = if hard {
                    InlineKind::HardBreak
                } else {
                    InlineKind::SoftBreak
                };
                out.push(Inline::new(Span::at(at, 1), kind));
                pos += 1;
                continue;
            }

            if let Some((inline, consumed)) = self.base_inline(text, pos, base) {
                match inline.kind {
                    InlineKind::Text(literal) => pending.push(&literal, at),
                    _ => {
                        pending.flush(&mut out);
                        out.push(inline);
                    }
                }
                pos += consumed;
                continue;
            }

            let len = self.text_run(rest);
            pending.push(&rest[..len], at);
            pos += len;
        }

        pending.flush(&mut out);
        out
    }

    fn inline_extension(&mut self, rest: &str, at: usize) -> Option<(Inline, usize)> {
        let extensions = self.extensions();
        extensions
            .iter()
            .filter(|extension| extension.level() == Level::Inline)
            .find_map(|extension| extension.tokenize_inline(self, rest, at))
    }

    fn text_run(&self, rest: &str) -> usize {
        let first = rest.chars().next().map_or(1, char::len_utf8);
        let tail = &rest[first..];
        let mut stop = tail.find(SPECIAL).unwrap_or(tail.len());
        for extension in self
            .extensions()
            .iter()
            .filter(|extension| extension.level() == Level::Inline)
        {
            if let Some(offset) = extension.probe(&tail[..stop]) {
                stop = stop.min(offset);
            }
        }
        first + stop
    }

    fn base_inline(&mut self, text: &str, pos: usize, base: usize) -> Option<(Inline, usize)> {
        let rest = &text[pos..];
        let at = base + pos;
        match rest.as_bytes()[0] {
            b'\\' => escape(rest, at),
            b'`' => Some(code_span(rest, at)),
            b'$' => dollar_math(rest, at),
            b'!' if rest.starts_with("![") => self.link(rest, at, true),
            b'[' => self.link(rest, at, false),
            b'<' => angle(rest, at),
            b'*' | b'_' => self.emphasis(text, pos, base),
            b'~' if rest.starts_with("~~") => self.strikethrough(rest, at),
            _ => None,
        }
    }

    fn emphasis(&mut self, text: &str, pos: usize, base: usize) -> Option<(Inline, usize)> {
        let rest = &text[pos..];
        let bytes = rest.as_bytes();
        let marker = bytes[0];
        let run = bytes.iter().take_while(|byte| **byte == marker).count();
        let next = rest[run..].chars().next()?;
        if next.is_whitespace() {
            return None;
        }
        if marker == b'_' && text[..pos].chars().next_back().is_some_and(char::is_alphanumeric) {
            return None;
        }
        let width = if run >= 2 { 2 } else { 1 };
        let closer = find_emphasis_closer(rest, marker, width)?;
        let children = self.inline_tokens(&rest[width..closer], base + pos + width);
        let kind = if width == 2 {
            InlineKind::Strong(children)
        } else {
            InlineKind::Emph(children)
        };
        let consumed = closer + width;
        Some((Inline::new(Span::at(base + pos, consumed), kind), consumed))
    }

    fn strikethrough(&mut self, rest: &str, at: usize) -> Option<(Inline, usize)> {
        let inner = &rest[2..];
        if inner.starts_with(char::is_whitespace) {
            return None;
        }
        let close = inner.find("~~").filter(|close| *close > 0)?;
        let children = self.inline_tokens(&inner[..close], at + 2);
        let consumed = close + 4;
        Some((
            Inline::new(Span::at(at, consumed), InlineKind::Strikethrough(children)),
            consumed,
        ))
    }

    fn link(&mut self, rest: &str, at: usize, image: bool) -> Option<(Inline, usize)> {
        let open = if image { 2 } else { 1 };
        let close = find_bracket_end(rest.as_bytes(), open)?;
        let destination = rest[close + 1..].strip_prefix('(')?;
        let (url, title, used) = parse_destination(destination)?;
        let label = self.inline_tokens(&rest[open..close], at + open);
        let consumed = close + 2 + used;
        let kind = if image {
            InlineKind::Image {
                url,
                title,
                alt: label,
            }
        } else {
            InlineKind::Link {
                url,
                title,
                children: label,
            }
        };
        Some((Inline::new(Span::at(at, consumed), kind), consumed))
    }
}

fn escape(rest: &str, at: usize) -> Option<(Inline, usize)> {
    let next = rest[1..].chars().next()?;
    match next {
        '\n' => Some((Inline::new(Span::at(at, 2), InlineKind::HardBreak), 2)),
        '(' => delimited_math(rest, at, "\\(", "\\)", false),
        '[' => delimited_math(rest, at, "\\[", "\\]", true),
        // The math engine resolves `\$` itself.
        '$' => Some((Inline::text(Span::at(at, 2), "\\$"), 2)),
        ch if ch.is_ascii_punctuation() => Some((Inline::text(Span::at(at, 2), ch), 2)),
        _ => None,
    }
}

fn delimited_math(
    rest: &str,
    at: usize,
    open: &str,
    close: &str,
    display: bool,
) -> Option<(Inline, usize)> {
    let inner = &rest[open.len()..];
    let end = inner.find(close)?;
    let tex = inner[..end].trim();
    if tex.is_empty() {
        return None;
    }
    let consumed = open.len() + end + close.len();
    Some((
        Inline::new(
            Span::at(at, consumed),
            InlineKind::MathInline {
                tex: tex.to_string(),
                display,
            },
        ),
        consumed,
    ))
}

fn dollar_math(rest: &str, at: usize) -> Option<(Inline, usize)> {
    if rest.starts_with("$$") {
        return delimited_math(rest, at, "$$", "$$", true);
    }
    let bytes = rest.as_bytes();
    let mut close = None;
    let mut i = 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'$' => {
                close = Some(i);
                break;
            }
            _ => i += 1,
        }
    }
    let close = close?;
    let tex = &rest[1..close];
    if tex.is_empty()
        || tex.starts_with(char::is_whitespace)
        || tex.ends_with(char::is_whitespace)
        || tex.contains("\n\n")
    {
        return None;
    }
    let consumed = close + 1;
    Some((
        Inline::new(
            Span::at(at, consumed),
            InlineKind::MathInline {
                tex: tex.to_string(),
                display: false,
            },
        ),
        consumed,
    ))
}

/// A backtick run closes at the next run of the same length; an unmatched run is literal.
fn code_span(rest: &str, at: usize) -> (Inline, usize) {
    let bytes = rest.as_bytes();
    let run = bytes.iter().take_while(|byte| **byte == b'`').count();
    let mut i = run;
    while i < bytes.len() {
        if bytes[i] != b'`' {
            i += 1;
            continue;
        }
        let close = bytes[i..].iter().take_while(|byte| **byte == b'`').count();
        if close == run {
            let raw = rest[run..i].replace('\n', " ");
            let code = if raw.len() >= 2
                && raw.starts_with(' ')
                && raw.ends_with(' ')
                && !raw.trim().is_empty()
            {
                raw[1..raw.len() - 1].to_string()
            } else {
                raw
            };
            let consumed = i + close;
            return (
                Inline::new(Span::at(at, consumed), InlineKind::CodeSpan(code)),
                consumed,
            );
        }
        i += close;
    }
    (Inline::text(Span::at(at, run), &rest[..run]), run)
}

fn angle(rest: &str, at: usize) -> Option<(Inline, usize)> {
    let end = rest.find('>')?;
    let inner = &rest[1..end];
    let consumed = end + 1;
    if inner.is_empty() || (inner.contains(char::is_whitespace) && !is_html_tag(inner)) {
        return None;
    }
    if !inner.contains(char::is_whitespace)
        && (inner.contains("://") || inner.starts_with("mailto:"))
    {
        let children = vec![Inline::text(Span::at(at + 1, inner.len()), inner)];
        return Some((
            Inline::new(
                Span::at(at, consumed),
                InlineKind::Link {
                    url: inner.to_string(),
                    title: None,
                    children,
                },
            ),
            consumed,
        ));
    }
    if is_html_tag(inner) {
        return Some((
            Inline::new(
                Span::at(at, consumed),
                InlineKind::HtmlSpan {
                    raw: rest[..consumed].to_string(),
                },
            ),
            consumed,
        ));
    }
    None
}

fn is_html_tag(inner: &str) -> bool {
    if inner.contains('\n') {
        return false;
    }
    let name = inner.strip_prefix('/').unwrap_or(inner);
    name.starts_with(|ch: char| ch.is_ascii_alphabetic()) || inner.starts_with("!--")
}

/// Closers of width 1 skip runs of exactly two so `*a **b** c*` nests.
fn find_emphasis_closer(rest: &str, marker: u8, width: usize) -> Option<usize> {
    let bytes = rest.as_bytes();
    let mut i = width + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'`' => {
                let run = bytes[i..].iter().take_while(|byte| **byte == b'`').count();
                let (_, consumed) = code_span(&rest[i..], 0);
                i += consumed.max(run);
            }
            byte if byte == marker => {
                let run = bytes[i..].iter().take_while(|byte| **byte == marker).count();
                let end = i + run;
                let flanking = !bytes[i - 1].is_ascii_whitespace();
                let fits = if width == 1 { run != 2 } else { run >= 2 };
                let intraword = marker == b'_'
                    && rest[end..].chars().next().is_some_and(char::is_alphanumeric);
                if flanking && fits && !intraword {
                    return Some(end - width);
                }
                i = end;
            }
            _ => i += 1,
        }
    }
    None
}

fn find_bracket_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = start;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 1,
            b'[' => depth += 1,
            b']' if depth == 0 => return Some(i),
            b']' => depth -= 1,
            _ => {}
        }
        i += 1;
    }
    None
}

/// Parses `url "title")` after the opening parenthesis; returns bytes used including `)`.
fn parse_destination(text: &str) -> Option<(String, Option<String>, usize)> {
    let bytes = text.as_bytes();
    let mut i = skip_spaces(bytes, 0);
    let url = if bytes.get(i) == Some(&b'<') {
        let end = text[i + 1..].find('>')? + i + 1;
        let url = text[i + 1..end].to_string();
        i = end + 1;
        url
    } else {
        let start = i;
        let mut depth = 0usize;
        while i < bytes.len() {
            match bytes[i] {
                b'(' => depth += 1,
                b')' if depth == 0 => break,
                b')' => depth -= 1,
                byte if byte.is_ascii_whitespace() => break,
                _ => {}
            }
            i += 1;
        }
        text[start..i].to_string()
    };

    i = skip_spaces(bytes, i);
    let mut title = None;
    if let Some(&quote) = bytes.get(i).filter(|byte| matches!(**byte, b'"' | b'\'')) {
        let end = text[i + 1..].find(quote as char)? + i + 1;
        title = Some(text[i + 1..end].to_string());
        i = skip_spaces(bytes, end + 1);
    }
    if bytes.get(i) != Some(&b')') {
        return None;
    }
    Some((url, title, i + 1))
}

fn skip_spaces(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    i
}

#[cfg(test)]
mod tests {
    use crate::engine::Engine;
    use crate::token::{InlineKind, plain_text};

    fn kinds(source: &str) -> Vec<InlineKind> {
        Engine::new()
            .tokenize_inline(source)
            .into_iter()
            .map(|inline| inline.kind)
            .collect()
    }

    #[test]
    fn adjacent_text_is_merged() {
        let inlines = Engine::new().tokenize_inline("a \\* b ! c");
        assert_eq!(inlines.len(), 1);
        assert_eq!(plain_text(&inlines), "a * b ! c");
    }

    #[test]
    fn strong_emphasis_and_nesting() {
        let inlines = Engine::new().tokenize_inline("*a **b** c*");
        let InlineKind::Emph(children) = &inlines[0].kind else {
            panic!("expected emphasis, got {:?}", inlines[0].kind);
        };
        assert!(children
            .iter()
            .any(|inline| matches!(inline.kind, InlineKind::Strong(_))));
        assert_eq!(plain_text(&inlines), "a b c");
    }

    #[test]
    fn intraword_underscore_is_literal() {
        assert_eq!(
            kinds("snake_case_name"),
            [InlineKind::Text("snake_case_name".to_string())]
        );
    }

    #[test]
    fn code_span_is_verbatim() {
        assert_eq!(
            kinds("`a *b*`"),
            [InlineKind::CodeSpan("a *b*".to_string())]
        );
        assert_eq!(kinds("``x"), [InlineKind::Text("``x".to_string())]);
    }

    #[test]
    fn dollar_math() {
        assert_eq!(
            kinds("$x_1$"),
            [InlineKind::MathInline {
                tex: "x_1".to_string(),
                display: false
            }]
        );
        assert_eq!(
            kinds("costs $5 and $ 6"),
            [InlineKind::Text("costs $5 and $ 6".to_string())]
        );
        assert_eq!(
            kinds("\\[a\\]"),
            [InlineKind::MathInline {
                tex: "a".to_string(),
                display: true
            }]
        );
    }

    #[test]
    fn escaped_dollar_keeps_backslash() {
        assert_eq!(kinds("\\$5"), [InlineKind::Text("\\$5".to_string())]);
    }

    #[test]
    fn links_and_images() {
        let inlines = Engine::new().tokenize_inline("[site](https://a.b \"T\") ![alt](x.png)");
        match &inlines[0].kind {
            InlineKind::Link { url, title, children } => {
                assert_eq!(url, "https://a.b");
                assert_eq!(title.as_deref(), Some("T"));
                assert_eq!(plain_text(children), "site");
            }
            other => panic!("expected link, got {:?}", other),
        }
        assert!(matches!(&inlines[2].kind, InlineKind::Image { url, .. } if url == "x.png"));
    }

    #[test]
    fn autolink_and_inline_html() {
        let inlines = Engine::new().tokenize_inline("<https://x.y> <br>");
        assert!(matches!(&inlines[0].kind, InlineKind::Link { url, .. } if url == "https://x.y"));
        assert!(matches!(&inlines[2].kind, InlineKind::HtmlSpan { raw } if raw == "<br>"));
        assert_eq!(kinds("a < b"), [InlineKind::Text("a < b".to_string())]);
    }

    #[test]
    fn strikethrough() {
        assert!(matches!(
            kinds("~~gone~~").as_slice(),
            [InlineKind::Strikethrough(_)]
        ));
    }
}
