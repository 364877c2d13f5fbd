//! Extension contract
//!
//! An extension hooks custom syntax into the engine and may keep
//! per-render state. The parser drives every extension through the same
//! lifecycle:
//!
//! 1. `register` once, when the engine is built
//! 2. `prepare` before each render
//! 3. `postprocess` on the rendered HTML, in registration order
//! 4. `before_publish` and `cleanup` when the article leaves the session

use markdown_it::MarkdownIt;

use crate::error::RenderResult;

pub trait Extension: Send + Sync {
    /// Stable identifier used in logs and errors
    fn name(&self) -> &'static str;

    /// Install tokenizers, tree passes and renderers
    fn register(&self, md: &mut MarkdownIt) -> RenderResult<()>;

    /// Reset per-render state
    fn prepare(&self) {}

    /// Transform the rendered HTML.
    ///
    /// `md` is the fully configured engine, available for sub-parses.
    fn postprocess(&self, html: String, _md: &MarkdownIt) -> String {
        html
    }

    /// Last chance to touch shared state before publishing
    fn before_publish(&self) {}

    /// Release anything held between renders
    fn cleanup(&self) {}
}
