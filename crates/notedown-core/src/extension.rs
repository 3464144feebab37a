//! Pluggable syntax recognized on top of the base markdown grammar.

use crate::emit::HtmlRenderer;
use crate::environment::{self, Environment};
use crate::error::ExtensionError;
use crate::lexer::{Lexer, Line};
use crate::spans;
use crate::token::{Block, BlockKind, Inline, InlineKind};

/// Which cursor the engine tries an extension at.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Level {
    Block,
    Inline,
}

/// A registered syntax extension. Definitions are stateless; all per-pass state
/// lives in [`RenderContext`](crate::RenderContext).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Extension {
    Highlight,
    ColoredText,
    HiddenText,
    Environment(Environment),
    TableOfContents,
}

impl Extension {
    /// Builds a callout extension for `keyword`; unknown keywords are a configuration error.
    pub fn environment(keyword: &str) -> Result<Self, ExtensionError> {
        Environment::from_keyword(keyword).map(Self::Environment)
    }

    /// The notedown extension set in priority order.
    pub fn defaults() -> Result<Vec<Self>, ExtensionError> {
        let mut out = vec![Self::Highlight, Self::ColoredText, Self::HiddenText];
        for keyword in ["note", "def", "warn"] {
            out.push(Self::environment(keyword)?);
        }
        out.push(Self::TableOfContents);
        Ok(out)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Highlight => "highlight",
            Self::ColoredText => "colored-text",
            Self::HiddenText => "hidden-text",
            Self::Environment(env) => env.name(),
            Self::TableOfContents => "table-of-contents",
        }
    }

    pub fn level(&self) -> Level {
        match self {
            Self::Highlight | Self::ColoredText | Self::HiddenText => Level::Inline,
            Self::Environment(_) | Self::TableOfContents => Level::Block,
        }
    }

    /// Byte offset of the earliest position in `src` where this extension could match.
    pub fn probe(&self, src: &str) -> Option<usize> {
        match self {
            Self::Highlight => spans::probe_highlight(src),
            Self::ColoredText => spans::probe_color(src),
            Self::HiddenText => spans::probe_hidden(src),
            Self::Environment(env) => env.probe(src),
            Self::TableOfContents => environment::probe_toc(src),
        }
    }

    /// Tries a block extension at `lines[0]`; returns the token and the number of lines consumed.
    pub(crate) fn tokenize_block(
        &self,
        lexer: &mut Lexer<'_>,
        lines: &[Line],
    ) -> Option<(Block, usize)> {
        match self {
            Self::Environment(env) => env.tokenize(lexer, lines),
            Self::TableOfContents => environment::tokenize_toc(lexer, lines),
            _ => None,
        }
    }

    /// Tries an inline extension at the start of `src`; returns the token and bytes consumed.
    pub(crate) fn tokenize_inline(
        &self,
        lexer: &mut Lexer<'_>,
        src: &str,
        base: usize,
    ) -> Option<(Inline, usize)> {
        match self {
            Self::Highlight => spans::tokenize_highlight(lexer, src, base),
            Self::ColoredText => spans::tokenize_color(lexer, src, base),
            Self::HiddenText => spans::tokenize_hidden(lexer, src, base),
            _ => None,
        }
    }

    pub(crate) fn render_block(&self, block: &Block, html: &mut HtmlRenderer<'_>) {
        match (&block.kind, self) {
            (BlockKind::Callout(callout), Self::Environment(_)) => {
                environment::render_callout(callout, html)
            }
            (BlockKind::TocPlaceholder, Self::TableOfContents) => html.toc_slot(),
            _ => {}
        }
    }

    pub(crate) fn render_inline(&self, inline: &Inline, html: &mut HtmlRenderer<'_>) -> String {
        match &inline.kind {
            InlineKind::Highlight(children) => spans::render_highlight(children, html),
            InlineKind::Color { value, children } => spans::render_color(value, children, html),
            InlineKind::Hidden(children) => spans::render_hidden(children, html),
            _ => String::new(),
        }
    }

    /// The extension that produced a block token, if any.
    pub(crate) fn of_block(kind: &BlockKind) -> Option<Self> {
        match kind {
            BlockKind::Callout(callout) => Some(Self::Environment(callout.environment)),
            BlockKind::TocPlaceholder => Some(Self::TableOfContents),
            _ => None,
        }
    }

    /// The extension that produced an inline token, if any.
    pub(crate) fn of_inline(kind: &InlineKind) -> Option<Self> {
        match kind {
            InlineKind::Highlight(_) => Some(Self::Highlight),
            InlineKind::Color { .. } => Some(Self::ColoredText),
            InlineKind::Hidden(_) => Some(Self::HiddenText),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Extension, Level};
    use crate::environment::Environment;
    use crate::error::ExtensionError;

    #[test]
    fn defaults_are_in_priority_order() {
        let names: Vec<_> = Extension::defaults()
            .expect("defaults")
            .iter()
            .map(Extension::name)
            .collect();
        assert_eq!(
            names,
            [
                "highlight",
                "colored-text",
                "hidden-text",
                "note",
                "definition",
                "warning",
                "table-of-contents"
            ]
        );
    }

    #[test]
    fn unknown_environment_is_rejected() {
        assert_eq!(
            Extension::environment("tip"),
            Err(ExtensionError::UnknownEnvironment("tip".to_string()))
        );
        assert_eq!(
            Extension::environment("def"),
            Ok(Extension::Environment(Environment::Definition))
        );
    }

    #[test]
    fn levels_split_inline_and_block() {
        assert_eq!(Extension::Highlight.level(), Level::Inline);
        assert_eq!(Extension::TableOfContents.level(), Level::Block);
    }

    #[test]
    fn probe_reports_earliest_offset() {
        assert_eq!(Extension::Highlight.probe("ab ==c=="), Some(3));
        assert_eq!(Extension::ColoredText.probe("x {c:red}y{/c}"), Some(2));
        assert_eq!(Extension::HiddenText.probe("plain"), None);
        assert_eq!(
            Extension::TableOfContents.probe("intro\n{toc}\n"),
            Some(6)
        );
    }
}
