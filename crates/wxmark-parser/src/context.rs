//! Shared services injected into every extension

use markdown_it::parser::extset::MarkdownItExt;
use markdown_it::MarkdownIt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::assets::AssetManager;
use crate::formula::MathRenderer;
use crate::images::LocalImageRegistry;
use crate::settings::RenderSettings;

/// Services an extension may depend on.
///
/// Cloning is cheap; all services are reference counted so every extension
/// in a session sees the same registry and cache.
#[derive(Debug, Clone, Default)]
pub struct RenderContext {
    pub settings: Arc<RenderSettings>,
    pub assets: Arc<AssetManager>,
    pub images: Arc<LocalImageRegistry>,
    pub math: Arc<MathRenderer>,
    pub embeds: Arc<EmbedDepth>,
}

impl MarkdownItExt for RenderContext {}

impl RenderContext {
    pub fn new(settings: RenderSettings) -> Self {
        Self {
            settings: Arc::new(settings),
            ..Default::default()
        }
    }

    pub fn with_assets(mut self, assets: AssetManager) -> Self {
        self.assets = Arc::new(assets);
        self
    }

    pub fn with_math(mut self, math: MathRenderer) -> Self {
        self.math = Arc::new(math);
        self
    }

    pub fn with_images(mut self, images: Arc<LocalImageRegistry>) -> Self {
        self.images = images;
        self
    }
}

/// Number of embedded-note parses in progress
#[derive(Debug, Default)]
pub struct EmbedDepth(AtomicUsize);

impl EmbedDepth {
    /// Count an embedded parse until the guard is dropped
    pub fn enter(&self) -> EmbedGuard<'_> {
        self.0.fetch_add(1, Ordering::SeqCst);
        EmbedGuard(self)
    }

    pub fn is_nested(&self) -> bool {
        self.0.load(Ordering::SeqCst) > 0
    }
}

pub struct EmbedGuard<'a>(&'a EmbedDepth);

impl Drop for EmbedGuard<'_> {
    fn drop(&mut self) {
        self.0 .0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Whether `md` is currently parsing an embedded note.
///
/// Passes that number or collect nodes skip embedded parses. The embedded
/// nodes are spliced into the outer tree, where the outer pass visits them
/// in document order.
pub fn in_embed(md: &MarkdownIt) -> bool {
    md.ext
        .get::<RenderContext>()
        .is_some_and(|context| context.embeds.is_nested())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embed_guard_nests() {
        let depth = EmbedDepth::default();
        assert!(!depth.is_nested());
        {
            let _outer = depth.enter();
            let _inner = depth.enter();
            assert!(depth.is_nested());
        }
        assert!(!depth.is_nested());
    }

    #[test]
    fn test_in_embed_reads_engine_context() {
        let context = RenderContext::default();
        let mut md = MarkdownIt::new();
        assert!(!in_embed(&md));

        md.ext.insert(context.clone());
        let _guard = context.embeds.enter();
        assert!(in_embed(&md));
    }
}
