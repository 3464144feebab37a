use std::mem;

use tracing::debug;

use crate::numbering::{CounterState, Slugger, UniqueSlugger};
use crate::registry::{HeadingRecord, HeadingRegistry};

/// Per-pass render state, threaded explicitly through every renderer call.
///
/// Counters, the heading registry and the slugger are reset by [`begin_pass`](Self::begin_pass);
/// the extension registration flag survives across passes.
#[derive(Debug)]
pub struct RenderContext {
    counters: CounterState,
    registry: HeadingRegistry,
    slugger: Box<dyn Slugger>,
    extensions_registered: bool,
}

impl Default for RenderContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderContext {
    pub fn new() -> Self {
        Self::with_slugger(Box::new(UniqueSlugger::new()))
    }

    /// Uses an external slugging strategy in place of the default unique slugger.
    pub fn with_slugger(slugger: Box<dyn Slugger>) -> Self {
        Self {
            counters: CounterState::new(),
            registry: HeadingRegistry::new(),
            slugger,
            extensions_registered: false,
        }
    }

    pub fn begin_pass(&mut self) {
        self.counters.reset();
        self.registry.clear();
        self.slugger.reset();
        debug!("render pass started");
    }

    pub fn counters(&self) -> &CounterState {
        &self.counters
    }

    pub fn headings(&self) -> &HeadingRegistry {
        &self.registry
    }

    pub fn extensions_registered(&self) -> bool {
        self.extensions_registered
    }

    /// Sets the one-shot registration flag. Returns `false` if it was already set.
    pub(crate) fn mark_extensions_registered(&mut self) -> bool {
        !mem::replace(&mut self.extensions_registered, true)
    }

    /// Advances the counters for `level`, derives the slug and appends the record.
    pub(crate) fn record_heading(&mut self, level: u8, title: String) -> HeadingRecord {
        let counter = self.counters.advance(level);
        let slug = self.slugger.slug(&title);
        let record = HeadingRecord::new(level, title, slug, counter);
        self.registry.push(record.clone());
        record
    }
}
