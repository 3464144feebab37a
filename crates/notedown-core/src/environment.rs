//! Callout environments (`{note}`, `{def}`, `{warn}`) and the `{toc}` placeholder.

use tracing::trace;

use crate::diagnostic::{W_CALLOUT_UNCLOSED, W_TOC_TRAILING};
use crate::emit::{HtmlRenderer, escape_attr};
use crate::error::ExtensionError;
use crate::lexer::{Lexer, Line};
use crate::span::Span;
use crate::token::{Block, BlockKind, Callout};

const TOC_MARKER: &str = "{toc}";

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Environment {
    Note,
    Definition,
    Warning,
}

impl Environment {
    pub fn from_keyword(keyword: &str) -> Result<Self, ExtensionError> {
        match keyword {
            "note" => Ok(Self::Note),
            "def" => Ok(Self::Definition),
            "warn" => Ok(Self::Warning),
            other => Err(ExtensionError::UnknownEnvironment(other.to_string())),
        }
    }

    /// The keyword used in `{keyword}` markers.
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Note => "note",
            Self::Definition => "def",
            Self::Warning => "warn",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Note => "note",
            Self::Definition => "definition",
            Self::Warning => "warning",
        }
    }

    /// The style class of the rendered container.
    pub fn class(&self) -> &'static str {
        match self {
            Self::Note => "note",
            Self::Definition => "definition",
            Self::Warning => "warn",
        }
    }

    pub(crate) fn probe(&self, src: &str) -> Option<usize> {
        line_offsets(src).find_map(|(offset, line)| self.opener(line).map(|_| offset))
    }

    /// Parses `{kw}` / `{kw:<id>}` and returns the id, if any.
    fn opener(&self, line: &str) -> Option<Option<u32>> {
        let inner = line
            .trim_end()
            .strip_prefix('{')?
            .strip_suffix('}')?
            .strip_prefix(self.keyword())?;
        if inner.is_empty() {
            return Some(None);
        }
        parse_id(inner.strip_prefix(':')?).map(Some)
    }

    fn closer(&self, id: Option<u32>) -> String {
        match id {
            Some(id) => format!("{{/{}:{}}}", self.keyword(), id),
            None => format!("{{/{}}}", self.keyword()),
        }
    }

    /// Opener line, exactly one title line, body lines, then the closer paired by id.
    /// Blank lines after the closer are consumed with the match.
    pub(crate) fn tokenize(&self, lexer: &mut Lexer<'_>, lines: &[Line]) -> Option<(Block, usize)> {
        let opener = lines.first()?;
        let id = self.opener(&opener.text)?;
        let closer = self.closer(id);
        let Some(close_idx) = (2..lines.len()).find(|&idx| lines[idx].text.trim_end() == closer)
        else {
            lexer.warn(
                Span::at(opener.start, opener.text.len()),
                W_CALLOUT_UNCLOSED,
                format!("`{}` has no matching `{}`", opener.text.trim_end(), closer),
            );
            return None;
        };

        let title_line = &lines[1];
        let title_text = title_line.text.trim_start();
        let title_offset = title_line.start + (title_line.text.len() - title_text.len());
        let title = lexer.inline_tokens(title_text.trim_end(), title_offset);
        let body = lexer.block_tokens(&lines[2..close_idx]);

        let mut next = close_idx + 1;
        while next < lines.len() && lines[next].is_blank() {
            next += 1;
        }
        trace!(environment = self.name(), ?id, lines = next, "callout");
        let span = Span {
            start: opener.start,
            end: lines[close_idx].end(),
        };
        Some((
            Block::new(
                span,
                BlockKind::Callout(Callout {
                    environment: *self,
                    id,
                    title,
                    body,
                }),
            ),
            next,
        ))
    }
}

pub(crate) fn probe_toc(src: &str) -> Option<usize> {
    line_offsets(src).find_map(|(offset, line)| (line.trim_end() == TOC_MARKER).then_some(offset))
}

/// `{toc}` on its own line, followed by a blank line or the end of input.
pub(crate) fn tokenize_toc(lexer: &mut Lexer<'_>, lines: &[Line]) -> Option<(Block, usize)> {
    let marker = lines.first()?;
    if marker.text.trim_end() != TOC_MARKER {
        return None;
    }
    if lines.get(1).is_some_and(|line| !line.is_blank()) {
        lexer.warn(
            Span::at(marker.start, marker.text.len()),
            W_TOC_TRAILING,
            "`{toc}` must be followed by a blank line",
        );
        return None;
    }
    let mut next = 1;
    while next < lines.len() && lines[next].is_blank() {
        next += 1;
    }
    Some((
        Block::new(Span::at(marker.start, marker.text.len()), BlockKind::TocPlaceholder),
        next,
    ))
}

pub(crate) fn render_callout(callout: &Callout, html: &mut HtmlRenderer<'_>) {
    let id_attr = callout
        .id
        .map(|id| format!(" data-callout-id=\"{}\"", id))
        .unwrap_or_default();
    html.line(&format!(
        "<div class=\"{}\"{}>",
        escape_attr(callout.environment.class()),
        id_attr
    ));
    html.indent();
    let title = html.inlines(&callout.title);
    html.line(&format!("<div class=\"title\">{}</div>", title));
    html.line("<div class=\"explanation\">");
    html.indent();
    html.blocks(&callout.body);
    html.dedent();
    html.line("</div>");
    html.dedent();
    html.line("</div>");
}

fn parse_id(text: &str) -> Option<u32> {
    if text.is_empty() || !text.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    text.parse::<u32>().ok().filter(|id| *id > 0)
}

fn line_offsets(src: &str) -> impl Iterator<Item = (usize, &str)> {
    let mut offset = 0;
    src.split('\n').map(move |line| {
        let start = offset;
        offset += line.len() + 1;
        (start, line)
    })
}
