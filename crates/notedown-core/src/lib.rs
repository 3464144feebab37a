mod config;
mod context;
mod diagnostic;
mod emit;
mod engine;
mod environment;
mod error;
mod extension;
mod inline;
mod lexer;
mod math;
mod numbering;
mod registry;
mod session;
mod source_map;
mod span;
mod spans;
mod toc;
mod token;

pub use config::{NotedownConfig, PageConfig, RenderConfig, Theme};
pub use context::RenderContext;
pub use diagnostic::{
    Diagnostic, DiagnosticSeverity, W_CALLOUT_UNCLOSED, W_HEADING_SKIP, W_TOC_TRAILING,
};
pub use emit::{HtmlRenderer, toc_html};
pub use engine::{Engine, LexResult};
pub use environment::Environment;
pub use error::{ConfigError, ExtensionError};
pub use extension::{Extension, Level};
pub use math::{DEFAULT_MATH_SCRIPT, MathConfig, TYPESET_TRIGGER};
pub use numbering::{
    CounterState, LiteralSlugger, MAX_HEADING_LEVEL, Slugger, UniqueSlugger, slugify,
};
pub use registry::{HeadingRecord, HeadingRegistry};
pub use session::{Notedown, Rendered, render};
pub use source_map::{Position, Range, SourceMap};
pub use span::Span;
pub use toc::{TocNode, build_toc};
pub use token::{
    Block, BlockKind, Callout, CodeBlock, Inline, InlineKind, InlineSeq, List, ListItem,
    plain_text,
};
