use crate::environment::Environment;
use crate::span::Span;

pub type InlineSeq = Vec<Inline>;

/// A block-level token. `span` is the raw source range the tokenizer consumed.
#[derive(Clone, Debug, PartialEq)]
pub struct Block {
    pub span: Span,
    pub kind: BlockKind,
}

#[derive(Clone, Debug, PartialEq)]
pub enum BlockKind {
    Paragraph {
        content: InlineSeq,
    },
    Heading {
        level: u8,
        title: InlineSeq,
    },
    List(List),
    BlockQuote {
        blocks: Vec<Block>,
    },
    CodeBlock(CodeBlock),
    MathBlock {
        tex: String,
    },
    ThematicBreak,
    Callout(Callout),
    TocPlaceholder,
}

#[derive(Clone, Debug, PartialEq)]
pub struct List {
    pub ordered: bool,
    pub start: Option<u64>,
    pub tight: bool,
    pub items: Vec<ListItem>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ListItem {
    pub span: Span,
    pub blocks: Vec<Block>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CodeBlock {
    pub lang: Option<String>,
    pub text: String,
}

/// A titled note/definition/warning environment.
#[derive(Clone, Debug, PartialEq)]
pub struct Callout {
    pub environment: Environment,
    pub id: Option<u32>,
    pub title: InlineSeq,
    pub body: Vec<Block>,
}

/// An inline token. Spans index the joined inline buffer of the enclosing block,
/// offset by that buffer's first source byte.
#[derive(Clone, Debug, PartialEq)]
pub struct Inline {
    pub span: Span,
    pub kind: InlineKind,
}

#[derive(Clone, Debug, PartialEq)]
pub enum InlineKind {
    Text(String),
    Emph(InlineSeq),
    Strong(InlineSeq),
    Strikethrough(InlineSeq),
    CodeSpan(String),
    SoftBreak,
    HardBreak,
    Link {
        url: String,
        title: Option<String>,
        children: InlineSeq,
    },
    Image {
        url: String,
        title: Option<String>,
        alt: InlineSeq,
    },
    MathInline {
        tex: String,
        display: bool,
    },
    HtmlSpan {
        raw: String,
    },
    Highlight(InlineSeq),
    Color {
        value: String,
        children: InlineSeq,
    },
    Hidden(InlineSeq),
}

impl Block {
    pub fn new(span: Span, kind: BlockKind) -> Self {
        Self { span, kind }
    }
}

impl Inline {
    pub fn new(span: Span, kind: InlineKind) -> Self {
        Self { span, kind }
    }

    pub fn text(span: Span, text: impl Into<String>) -> Self {
        Self::new(span, InlineKind::Text(text.into()))
    }
}

/// Flattens inline tokens into the plain text used for slugs and outlines.
pub fn plain_text(inlines: &[Inline]) -> String {
    let mut out = String::new();
    push_plain_text(inlines, &mut out);
    out
}

fn push_plain_text(inlines: &[Inline], out: &mut String) {
    for inline in inlines {
        match &inline.kind {
            InlineKind::Text(text) | InlineKind::CodeSpan(text) => out.push_str(text),
            InlineKind::MathInline { tex, .. } => out.push_str(tex),
            InlineKind::SoftBreak | InlineKind::HardBreak => out.push(' '),
            InlineKind::Emph(children)
            | InlineKind::Strong(children)
            | InlineKind::Strikethrough(children)
            | InlineKind::Highlight(children)
            | InlineKind::Hidden(children)
            | InlineKind::Color { children, .. }
            | InlineKind::Link { children, .. } => push_plain_text(children, out),
            InlineKind::Image { alt, .. } => push_plain_text(alt, out),
            InlineKind::HtmlSpan { .. } => {}
        }
    }
}
