use tracing::debug;

use crate::context::RenderContext;
use crate::diagnostic::Diagnostic;
use crate::emit::HtmlRenderer;
use crate::extension::Extension;
use crate::lexer::{Lexer, split_lines};
use crate::source_map::SourceMap;
use crate::token::{Block, InlineSeq};

/// Output of [`Engine::lex`].
#[derive(Debug)]
pub struct LexResult {
    pub blocks: Vec<Block>,
    pub diagnostics: Vec<Diagnostic>,
    pub source_map: SourceMap,
}

/// The base markdown engine with its registered extensions.
#[derive(Clone, Debug, Default)]
pub struct Engine {
    extensions: Vec<Extension>,
}

impl Engine {
    /// An engine with no extensions: plain base grammar only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `extension` to the priority list. Registering the same extension twice is a no-op.
    pub fn register(&mut self, extension: Extension) {
        if self.extensions.contains(&extension) {
            debug!(extension = extension.name(), "extension already registered");
            return;
        }
        debug!(
            extension = extension.name(),
            priority = self.extensions.len(),
            "registered extension"
        );
        self.extensions.push(extension);
    }

    pub fn use_extensions(&mut self, extensions: impl IntoIterator<Item = Extension>) {
        for extension in extensions {
            self.register(extension);
        }
    }

    pub fn extensions(&self) -> &[Extension] {
        &self.extensions
    }

    pub fn lex(&self, source: &str) -> LexResult {
        let source_map = SourceMap::new(source);
        let lines = split_lines(source);
        let (blocks, diagnostics) = {
            let mut lexer = Lexer::new(&self.extensions, &source_map);
            let blocks = lexer.block_tokens(&lines);
            (blocks, lexer.into_diagnostics())
        };
        LexResult {
            blocks,
            diagnostics,
            source_map,
        }
    }

    pub fn tokenize_block(&self, text: &str) -> Vec<Block> {
        self.lex(text).blocks
    }

    pub fn tokenize_inline(&self, text: &str) -> InlineSeq {
        let source_map = SourceMap::new(text);
        let mut lexer = Lexer::new(&self.extensions, &source_map);
        lexer.inline_tokens(text, 0)
    }

    /// Renders `blocks`, numbering headings into `context`. Table-of-contents
    /// placeholders see every heading of the call, including later ones.
    pub fn render(&self, blocks: &[Block], context: &mut RenderContext) -> String {
        let mut html = HtmlRenderer::new(context);
        html.blocks(blocks);
        html.finish()
    }
}
