//! WeChat Markdown Renderer
//!
//! Turns Obsidian-flavoured Markdown into HTML that survives the WeChat
//! official-account editor. This crate provides:
//! - An extension contract and the standard extension chain (callouts,
//!   footnotes, formulas, icons, embeds, topics and more)
//! - A parser that builds the engine once and renders many documents
//! - Asset resolution, a local image registry and a formula cache shared
//!   across a session

pub mod assets;
pub mod context;
pub mod error;
pub mod extension;
pub mod extensions;
pub mod formula;
pub mod front_matter;
pub mod images;
pub mod parser;
pub mod settings;
pub mod svg;
pub mod token;

// Re-export main types for convenience
pub use assets::{AssetManager, ResourcePath};
pub use context::RenderContext;
pub use error::{RenderError, RenderResult};
pub use extension::Extension;
pub use extensions::default_extensions;
pub use formula::{FormulaError, FormulaRenderer, MathRenderer, PlaceholderRenderer};
pub use images::{ImageInfo, LocalImageRegistry};
pub use parser::WxParser;
pub use settings::{EmbedStyle, LinkStyle, MathDialect, RenderSettings};
pub use token::WxToken;
