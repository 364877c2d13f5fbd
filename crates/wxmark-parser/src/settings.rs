//! User-facing rendering settings
//!
//! Settings are plain serde structs so they can be stored as TOML next to
//! the vault. Every field has a default, so partial files are accepted.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::RenderResult;

/// Formula dialect handed to the math backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MathDialect {
    #[default]
    Latex,
    Asciimath,
}

impl MathDialect {
    /// Map a fenced code block language tag to a dialect.
    ///
    /// Returns `None` for languages that are not formula languages.
    pub fn from_fence_lang(lang: &str) -> Option<Self> {
        match lang.trim().to_ascii_lowercase().as_str() {
            "latex" | "tex" => Some(Self::Latex),
            "am" | "asciimath" => Some(Self::Asciimath),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Latex => "latex",
            Self::Asciimath => "asciimath",
        }
    }
}

/// How external links are presented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkStyle {
    /// `text[href]`
    #[default]
    Inline,
    /// `text[n]` plus a numbered list at the end of the article
    Footnote,
}

/// Wrapper used for embedded notes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedStyle {
    #[default]
    Content,
    Quote,
}

/// Rendering settings shared by all extensions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Dialect used for `$...$` and `$$...$$` formulas
    pub math: MathDialect,

    /// Presentation of external links
    pub link_style: LinkStyle,

    /// Wrap images in `<figure>` with a `<figcaption>`
    pub use_figcaption: bool,

    /// Preserve runs of blank lines as empty paragraphs
    pub enable_empty_line: bool,

    /// Emit a line-number gutter for code blocks
    pub line_number: bool,

    /// Prefix headings with their hierarchical number (1.2.)
    pub heading_numbers: bool,

    /// Wrapper for embedded notes
    pub embed_style: EmbedStyle,

    /// Maximum nesting of note embeds
    pub max_embed_depth: usize,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            math: MathDialect::Latex,
            link_style: LinkStyle::Inline,
            use_figcaption: false,
            enable_empty_line: false,
            line_number: true,
            heading_numbers: false,
            embed_style: EmbedStyle::Content,
            max_embed_depth: 3,
        }
    }
}

impl RenderSettings {
    /// Parse settings from a TOML document
    pub fn from_toml_str(content: &str) -> RenderResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load settings from a TOML file
    pub async fn load(path: impl AsRef<Path>) -> RenderResult<Self> {
        let content = tokio::fs::read_to_string(path.as_ref()).await?;
        Self::from_toml_str(&content)
    }

    /// Serialize settings back to TOML
    pub fn to_toml_string(&self) -> RenderResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
