//! Formula rendering with a per-session cache
//!
//! The actual typesetting backend sits behind [`FormulaRenderer`]; the
//! default backend emits a readable placeholder. [`MathRenderer`] adds
//! caching, element IDs and the wrapper markup.

use markdown_it::common::utils::escape_html;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;
use tracing::{debug, warn};

use crate::settings::MathDialect;

/// Failure reported by a formula backend
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct FormulaError(pub String);

/// Converts a formula into SVG (or other inline) markup
pub trait FormulaRenderer: Send + Sync {
    fn render(
        &self,
        expression: &str,
        display: bool,
        dialect: MathDialect,
    ) -> Result<String, FormulaError>;
}

/// Backend that keeps the source formula visible
#[derive(Debug, Default, Clone, Copy)]
pub struct PlaceholderRenderer;

impl FormulaRenderer for PlaceholderRenderer {
    fn render(
        &self,
        expression: &str,
        display: bool,
        _dialect: MathDialect,
    ) -> Result<String, FormulaError> {
        if display {
            Ok(format!(
                "<div class=\"math-block\">$${}$$</div>",
                escape_html(expression)
            ))
        } else {
            Ok(format!(
                "<span class=\"math-inline\">${}$</span>",
                escape_html(expression)
            ))
        }
    }
}

/// Session math service shared by the math and code extensions
pub struct MathRenderer {
    backend: Box<dyn FormulaRenderer>,
    cache: Mutex<HashMap<String, String>>,
    next_id: AtomicUsize,
}

impl std::fmt::Debug for MathRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MathRenderer")
            .field("cached", &self.len())
            .field("next_id", &self.next_id.load(Ordering::Relaxed))
            .finish()
    }
}

impl Default for MathRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl MathRenderer {
    pub fn new() -> Self {
        Self::with_backend(PlaceholderRenderer)
    }

    pub fn with_backend(backend: impl FormulaRenderer + 'static) -> Self {
        Self {
            backend: Box::new(backend),
            cache: Mutex::new(HashMap::new()),
            next_id: AtomicUsize::new(0),
        }
    }

    /// Render a formula and wrap it in its element.
    ///
    /// `block` selects the block wrapper; `display` is passed to the
    /// backend. Backend failures produce a visible error span and are not
    /// cached.
    pub fn render(&self, expression: &str, block: bool, display: bool, dialect: MathDialect) -> String {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let body = self.svg_for(expression, block || display, dialect);

        if block {
            format!(
                "<span id=\"math-id-{}\" class=\"block-math-svg\"><section class=\"block-math-section\">{}</section></span>",
                id, body
            )
        } else {
            format!(
                "<span id=\"math-id-{}\" class=\"inline-math-svg\">{}</span>",
                id, body
            )
        }
    }

    fn svg_for(&self, expression: &str, display: bool, dialect: MathDialect) -> String {
        if let Some(svg) = self.cached(expression) {
            debug!(expression, "math cache hit");
            return svg;
        }

        match self.backend.render(expression, display, dialect) {
            Ok(svg) => {
                self.cache.lock().insert(expression.to_string(), svg.clone());
                svg
            }
            Err(e) => {
                warn!(expression, error = %e, "formula rendering failed");
                format!(
                    "<span class=\"math-error\">数学公式: {}</span>",
                    escape_html(expression)
                )
            }
        }
    }

    /// Restart element ids at `math-id-1`, e.g. for a new document
    pub fn reset_ids(&self) {
        self.next_id.store(0, Ordering::Relaxed);
    }

    pub fn cached(&self, expression: &str) -> Option<String> {
        self.cache.lock().get(expression).cloned()
    }

    pub fn len(&self) -> usize {
        self.cache.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop all cached renders
    pub fn clear(&self) {
        self.cache.lock().clear();
    }
}
