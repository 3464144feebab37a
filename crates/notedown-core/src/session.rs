use serde::Serialize;
use tracing::debug;

use crate::context::RenderContext;
use crate::diagnostic::Diagnostic;
use crate::engine::Engine;
use crate::error::ExtensionError;
use crate::extension::Extension;
use crate::registry::HeadingRegistry;

/// The result of one render pass.
#[derive(Clone, Debug, Serialize)]
pub struct Rendered {
    pub html: String,
    pub headings: HeadingRegistry,
    pub diagnostics: Vec<Diagnostic>,
}

/// An engine plus its render context. Extensions are registered once, on the
/// first [`init`](Self::init); every [`render`](Self::render) is an independent pass.
#[derive(Debug, Default)]
pub struct Notedown {
    engine: Engine,
    context: RenderContext,
}

impl Notedown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_context(context: RenderContext) -> Self {
        Self {
            engine: Engine::new(),
            context,
        }
    }

    /// Registers the default extensions. Later calls are no-ops.
    pub fn init(&mut self) -> Result<(), ExtensionError> {
        if !self.context.mark_extensions_registered() {
            debug!("extensions already registered");
            return Ok(());
        }
        self.engine.use_extensions(Extension::defaults()?);
        Ok(())
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn context(&self) -> &RenderContext {
        &self.context
    }

    pub fn render(&mut self, source: &str) -> Result<Rendered, ExtensionError> {
        self.init()?;
        self.context.begin_pass();
        let lexed = self.engine.lex(source);
        let html = self.engine.render(&lexed.blocks, &mut self.context);
        debug!(
            headings = self.context.headings().len(),
            diagnostics = lexed.diagnostics.len(),
            "render pass finished"
        );
        Ok(Rendered {
            html,
            headings: self.context.headings().clone(),
            diagnostics: lexed.diagnostics,
        })
    }
}

/// Renders `source` in a fresh session.
pub fn render(source: &str) -> Result<Rendered, ExtensionError> {
    Notedown::new().render(source)
}

#[cfg(test)]
mod tests {
    use super::Notedown;

    #[test]
    fn init_is_idempotent() {
        let mut session = Notedown::new();
        session.init().expect("init");
        let count = session.engine().extensions().len();
        session.init().expect("init");
        assert_eq!(session.engine().extensions().len(), count);
        assert!(session.context().extensions_registered());
    }

    #[test]
    fn render_initializes_lazily() {
        let mut session = Notedown::new();
        let rendered = session.render("==x==").expect("render");
        assert_eq!(rendered.html, "<p><mark class=\"highlight\">x</mark></p>");
    }
}
