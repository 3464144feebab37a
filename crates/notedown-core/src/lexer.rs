//! Line-based block tokenizer for the base markdown grammar. Registered block
//! extensions are tried at every block start before the base rules.

use tracing::warn;

use crate::diagnostic::{Diagnostic, W_HEADING_SKIP};
use crate::extension::{Extension, Level};
use crate::source_map::SourceMap;
use crate::span::Span;
use crate::token::{Block, BlockKind, CodeBlock, List, ListItem};

#[derive(Clone, Debug)]
pub(crate) struct Line {
    pub(crate) text: String,
    /// Source offset of `text[0]`.
    pub(crate) start: usize,
}

impl Line {
    pub(crate) fn end(&self) -> usize {
        self.start + self.text.len()
    }

    pub(crate) fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    fn strip(&self, bytes: usize) -> Line {
        let bytes = bytes.min(self.text.len());
        Line {
            text: self.text[bytes..].to_string(),
            start: self.start + bytes,
        }
    }
}

pub(crate) fn split_lines(source: &str) -> Vec<Line> {
    let mut lines = Vec::new();
    let mut start = 0;
    for segment in source.split('\n') {
        let text = segment.strip_suffix('\r').unwrap_or(segment);
        lines.push(Line {
            text: text.to_string(),
            start,
        });
        start += segment.len() + 1;
    }
    lines
}

/// Tokenizer state for one pass over one document.
pub struct Lexer<'e> {
    extensions: &'e [Extension],
    source_map: &'e SourceMap,
    diagnostics: Vec<Diagnostic>,
    last_heading_level: Option<u8>,
}

impl<'e> Lexer<'e> {
    pub(crate) fn new(extensions: &'e [Extension], source_map: &'e SourceMap) -> Self {
        Self {
            extensions,
            source_map,
            diagnostics: Vec::new(),
            last_heading_level: None,
        }
    }

    pub(crate) fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    pub(crate) fn extensions(&self) -> &'e [Extension] {
        self.extensions
    }

    pub(crate) fn warn(&mut self, span: Span, code: &'static str, message: impl Into<String>) {
        let diagnostic = Diagnostic::warning(self.source_map.range(span), code, message);
        warn!(
            code,
            line = diagnostic.range.start.line + 1,
            "{}",
            diagnostic.message
        );
        self.diagnostics.push(diagnostic);
    }

    pub(crate) fn block_tokens(&mut self, lines: &[Line]) -> Vec<Block> {
        let mut blocks = Vec::new();
        let mut i = 0;

        while i < lines.len() {
            if lines[i].is_blank() {
                i += 1;
                continue;
            }

            if let Some((block, next)) = self.block_extension(lines, i) {
                blocks.push(block);
                i = next;
                continue;
            }

            if let Some((block, next)) = self.fenced_code(lines, i) {
                blocks.push(block);
                i = next;
                continue;
            }

            if let Some((block, next)) = self.math_block(lines, i) {
                blocks.push(block);
                i = next;
                continue;
            }

            if let Some((block, next)) = self.heading(lines, i) {
                blocks.push(block);
                i = next;
                continue;
            }

            if let Some((block, next)) = self.thematic_break(lines, i) {
                blocks.push(block);
                i = next;
                continue;
            }

            if let Some((block, next)) = self.block_quote(lines, i) {
                blocks.push(block);
                i = next;
                continue;
            }

            if let Some((block, next)) = self.list(lines, i) {
                blocks.push(block);
                i = next;
                continue;
            }

            let (block, next) = self.paragraph(lines, i);
            blocks.push(block);
            i = next;
        }

        blocks
    }

    fn block_extension(&mut self, lines: &[Line], start: usize) -> Option<(Block, usize)> {
        let extensions = self.extensions;
        for extension in extensions
            .iter()
            .filter(|extension| extension.level() == Level::Block)
        {
            if let Some((block, consumed)) = extension.tokenize_block(self, &lines[start..]) {
                return Some((block, start + consumed));
            }
        }
        None
    }

    fn fenced_code(&mut self, lines: &[Line], start: usize) -> Option<(Block, usize)> {
        let fence = parse_fence_open(&lines[start].text)?;
        let mut body = Vec::new();
        let mut i = start + 1;
        while i < lines.len() {
            let text = &lines[i].text;
            i += 1;
            if is_fence_close(text, fence.len, fence.ch) {
                break;
            }
            body.push(strip_leading_spaces(text, fence.indent));
        }
        let mut text = body.join("\n");
        if !body.is_empty() {
            text.push('\n');
        }
        let lang = fence.info.split_whitespace().next().map(str::to_string);
        let span = Span {
            start: lines[start].start,
            end: lines[i - 1].end(),
        };
        Some((
            Block::new(span, BlockKind::CodeBlock(CodeBlock { lang, text })),
            i,
        ))
    }

    /// `$$` on its own line up to a line ending in `$$`, or `$$ tex $$` on one line.
    fn math_block(&mut self, lines: &[Line], start: usize) -> Option<(Block, usize)> {
        let line = &lines[start];
        let trimmed = line.text.trim();
        if trimmed != "$$" {
            let inner = trimmed.strip_prefix("$$")?.strip_suffix("$$")?.trim();
            if inner.is_empty() || inner.contains("$$") {
                return None;
            }
            let span = Span::at(line.start, line.text.len());
            return Some((
                Block::new(
                    span,
                    BlockKind::MathBlock {
                        tex: inner.to_string(),
                    },
                ),
                start + 1,
            ));
        }

        let mut tex = Vec::new();
        for (idx, candidate) in lines.iter().enumerate().skip(start + 1) {
            let text = candidate.text.trim();
            if let Some(before) = text.strip_suffix("$$") {
                if !before.trim().is_empty() {
                    tex.push(before.trim_end());
                }
                let span = Span {
                    start: line.start,
                    end: candidate.end(),
                };
                return Some((
                    Block::new(
                        span,
                        BlockKind::MathBlock {
                            tex: tex.join("\n"),
                        },
                    ),
                    idx + 1,
                ));
            }
            tex.push(text);
        }
        None
    }

    fn heading(&mut self, lines: &[Line], start: usize) -> Option<(Block, usize)> {
        let line = &lines[start];
        let (level, content_start, content_end) = parse_atx_heading(&line.text)?;
        let span = Span::at(line.start, line.text.len());
        if let Some(previous) = self.last_heading_level {
            if level > previous + 1 {
                self.warn(
                    span,
                    W_HEADING_SKIP,
                    format!("heading level jumps from {} to {}", previous, level),
                );
            }
        }
        self.last_heading_level = Some(level);
        let title = self.inline_tokens(
            &line.text[content_start..content_end],
            line.start + content_start,
        );
        Some((Block::new(span, BlockKind::Heading { level, title }), start + 1))
    }

    fn thematic_break(&self, lines: &[Line], start: usize) -> Option<(Block, usize)> {
        let line = &lines[start];
        if !is_thematic_break_line(&line.text) {
            return None;
        }
        Some((
            Block::new(Span::at(line.start, line.text.len()), BlockKind::ThematicBreak),
            start + 1,
        ))
    }

    fn block_quote(&mut self, lines: &[Line], start: usize) -> Option<(Block, usize)> {
        let first = strip_quote_prefix(&lines[start])?;
        let mut inner = vec![first];
        let mut i = start + 1;
        while i < lines.len() {
            let line = &lines[i];
            if let Some(stripped) = strip_quote_prefix(line) {
                inner.push(stripped);
            } else if !line.is_blank()
                && inner.last().is_some_and(|last| !last.is_blank())
                && !self.interrupts_paragraph(line)
            {
                // Lazy paragraph continuation.
                inner.push(line.clone());
            } else {
                break;
            }
            i += 1;
        }
        let blocks = self.block_tokens(&inner);
        let span = Span {
            start: lines[start].start,
            end: lines[i - 1].end(),
        };
        Some((Block::new(span, BlockKind::BlockQuote { blocks }), i))
    }

    fn list(&mut self, lines: &[Line], start: usize) -> Option<(Block, usize)> {
        let first = parse_list_marker(&lines[start].text)?;
        let mut marker = first;
        let mut items = Vec::new();
        let mut loose = false;
        let mut i = start;

        loop {
            let mut item_lines = vec![lines[i].strip(marker.content_indent)];
            let mut j = i + 1;
            let mut after_blank = false;
            while j < lines.len() {
                let line = &lines[j];
                if line.is_blank() {
                    item_lines.push(line.strip(line.text.len()));
                    after_blank = true;
                } else if leading_spaces(&line.text) >= marker.content_indent {
                    item_lines.push(line.strip(marker.content_indent));
                    after_blank = false;
                } else if !after_blank
                    && !self.interrupts_paragraph(line)
                    && parse_list_marker(&line.text).is_none()
                {
                    item_lines.push(line.strip(leading_spaces(&line.text)));
                } else {
                    break;
                }
                j += 1;
            }

            let mut trailing_blanks = 0;
            while item_lines.last().is_some_and(Line::is_blank) {
                item_lines.pop();
                trailing_blanks += 1;
            }
            let inner_blank = item_lines.iter().any(Line::is_blank);
            let blocks = self.block_tokens(&item_lines);
            if inner_blank && blocks.len() > 1 {
                loose = true;
            }
            let item_end = item_lines.last().map_or(lines[i].end(), Line::end);
            items.push(ListItem {
                span: Span {
                    start: lines[i].start,
                    end: item_end,
                },
                blocks,
            });

            match lines.get(j).and_then(|line| parse_list_marker(&line.text)) {
                Some(next) if next.continues(&marker) => {
                    if trailing_blanks > 0 {
                        loose = true;
                    }
                    marker = next;
                    i = j;
                }
                _ => {
                    i = j;
                    break;
                }
            }
        }

        let span = Span {
            start: lines[start].start,
            end: items.last().map_or(lines[start].end(), |item| item.span.end),
        };
        Some((
            Block::new(
                span,
                BlockKind::List(List {
                    ordered: first.ordered,
                    start: first.start,
                    tight: !loose,
                    items,
                }),
            ),
            i,
        ))
    }

    fn paragraph(&mut self, lines: &[Line], start: usize) -> (Block, usize) {
        let mut i = start + 1;
        while i < lines.len() && !lines[i].is_blank() && !self.interrupts_paragraph(&lines[i]) {
            i += 1;
        }

        let first = &lines[start];
        let first_text = first.text.trim_start();
        let base = first.start + (first.text.len() - first_text.len());
        let mut buffer = first_text.to_string();
        for line in &lines[start + 1..i] {
            buffer.push('\n');
            buffer.push_str(line.text.trim_start());
        }
        let content = self.inline_tokens(buffer.trim_end(), base);
        let span = Span {
            start: first.start,
            end: lines[i - 1].end(),
        };
        (Block::new(span, BlockKind::Paragraph { content }), i)
    }

    fn interrupts_paragraph(&self, line: &Line) -> bool {
        let text = &line.text;
        if self
            .extensions
            .iter()
            .any(|extension| extension.level() == Level::Block && extension.probe(text) == Some(0))
        {
            return true;
        }
        if parse_fence_open(text).is_some()
            || parse_atx_heading(text).is_some()
            || is_thematic_break_line(text)
            || strip_quote_prefix(line).is_some()
            || text.trim() == "$$"
        {
            return true;
        }
        match parse_list_marker(text) {
            Some(marker) => !marker.empty && (!marker.ordered || marker.start == Some(1)),
            None => false,
        }
    }
}

struct Fence {
    indent: usize,
    len: usize,
    ch: u8,
    info: String,
}

fn parse_fence_open(text: &str) -> Option<Fence> {
    let indent = leading_spaces(text);
    if indent > 3 {
        return None;
    }
    let rest = &text[indent..];
    let ch = if rest.starts_with("```") {
        b'`'
    } else if rest.starts_with("~~~") {
        b'~'
    } else {
        return None;
    };
    let len = rest.bytes().take_while(|byte| *byte == ch).count();
    let info = rest[len..].trim();
    if ch == b'`' && info.contains('`') {
        return None;
    }
    Some(Fence {
        indent,
        len,
        ch,
        info: info.to_string(),
    })
}

fn is_fence_close(text: &str, fence_len: usize, fence_char: u8) -> bool {
    let indent = leading_spaces(text);
    if indent > 3 {
        return false;
    }
    let rest = &text.as_bytes()[indent..];
    let count = rest.iter().take_while(|byte| **byte == fence_char).count();
    count >= fence_len && rest[count..].iter().all(|byte| *byte == b' ' || *byte == b'\t')
}

fn strip_leading_spaces(text: &str, max: usize) -> &str {
    let count = leading_spaces(text).min(max);
    &text[count..]
}

fn leading_spaces(text: &str) -> usize {
    text.bytes().take_while(|byte| *byte == b' ').count()
}

fn parse_atx_heading(text: &str) -> Option<(u8, usize, usize)> {
    let indent = leading_spaces(text);
    if indent > 3 {
        return None;
    }
    let bytes = &text.as_bytes()[indent..];
    let level = bytes.iter().take_while(|byte| **byte == b'#').count();
    if level == 0 || level > 6 {
        return None;
    }
    if level < bytes.len() && !is_space_or_tab(bytes[level]) {
        return None;
    }
    let mut content_start = level;
    while content_start < bytes.len() && is_space_or_tab(bytes[content_start]) {
        content_start += 1;
    }
    let mut content_end = bytes.len();
    while content_end > content_start && is_space_or_tab(bytes[content_end - 1]) {
        content_end -= 1;
    }
    // Optional closing sequence: a run of `#` preceded by whitespace (or the whole content).
    let mut hash_start = content_end;
    while hash_start > content_start && bytes[hash_start - 1] == b'#' {
        hash_start -= 1;
    }
    if hash_start < content_end
        && (hash_start == content_start || is_space_or_tab(bytes[hash_start - 1]))
    {
        content_end = hash_start;
        while content_end > content_start && is_space_or_tab(bytes[content_end - 1]) {
            content_end -= 1;
        }
    }
    Some((level as u8, indent + content_start, indent + content_end))
}

fn is_thematic_break_line(text: &str) -> bool {
    if leading_spaces(text) > 3 {
        return false;
    }
    let mut marker = None;
    let mut count = 0;
    for byte in text.bytes() {
        if is_space_or_tab(byte) {
            continue;
        }
        match marker {
            None if matches!(byte, b'-' | b'*' | b'_') => marker = Some(byte),
            Some(existing) if existing == byte => {}
            _ => return false,
        }
        count += 1;
    }
    count >= 3
}

fn is_space_or_tab(byte: u8) -> bool {
    byte == b' ' || byte == b'\t'
}

fn strip_quote_prefix(line: &Line) -> Option<Line> {
    let indent = leading_spaces(&line.text);
    if indent > 3 || line.text.as_bytes().get(indent) != Some(&b'>') {
        return None;
    }
    let mut skip = indent + 1;
    if line.text.as_bytes().get(skip) == Some(&b' ') {
        skip += 1;
    }
    Some(line.strip(skip))
}

#[derive(Clone, Copy, Debug)]
struct ListMarker {
    ordered: bool,
    start: Option<u64>,
    /// `-`, `+`, `*` for bullets; `.` or `)` for ordered markers.
    delimiter: u8,
    content_indent: usize,
    empty: bool,
}

impl ListMarker {
    fn continues(&self, previous: &ListMarker) -> bool {
        self.ordered == previous.ordered && self.delimiter == previous.delimiter
    }
}

fn parse_list_marker(text: &str) -> Option<ListMarker> {
    if is_thematic_break_line(text) {
        return None;
    }
    let indent = leading_spaces(text);
    if indent > 3 {
        return None;
    }
    let bytes = &text.as_bytes()[indent..];
    let first = *bytes.first()?;

    let (ordered, start, delimiter, width) = if matches!(first, b'-' | b'+' | b'*') {
        (false, None, first, 1)
    } else {
        let digits = bytes.iter().take_while(|byte| byte.is_ascii_digit()).count();
        if digits == 0 || digits > 9 {
            return None;
        }
        let delimiter = *bytes.get(digits)?;
        if delimiter != b'.' && delimiter != b')' {
            return None;
        }
        let start = text[indent..indent + digits].parse::<u64>().ok();
        (true, start, delimiter, digits + 1)
    };

    let after = &bytes[width..];
    if after.is_empty() {
        return Some(ListMarker {
            ordered,
            start,
            delimiter,
            content_indent: indent + width + 1,
            empty: true,
        });
    }
    if after[0] != b' ' {
        return None;
    }
    let spaces = after.iter().take_while(|byte| **byte == b' ').count();
    let empty = spaces == after.len();
    let padding = if empty || spaces > 4 { 1 } else { spaces };
    Some(ListMarker {
        ordered,
        start,
        delimiter,
        content_indent: indent + width + padding,
        empty,
    })
}
