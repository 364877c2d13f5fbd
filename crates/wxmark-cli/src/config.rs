//! CLI configuration
//!
//! ```toml
//! vault = "~/notes"
//! icons_dir = "~/notes/icons"
//!
//! [render]
//! link_style = "footnote"
//! line_number = false
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use wxmark_parser::{AssetManager, RenderContext, RenderSettings};

use crate::cli::RenderOverrides;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Vault root for embeds and local images
    pub vault: Option<PathBuf>,
    /// Custom icon directory
    pub icons_dir: Option<PathBuf>,
    pub render: RenderSettings,
}

impl CliConfig {
    /// Load configuration with precedence: defaults < file < args
    pub fn load(config_file: Option<PathBuf>, vault: Option<PathBuf>) -> Result<Self> {
        let mut config = Self::from_file_or_default(config_file)?;
        if let Some(vault) = vault {
            config.vault = Some(vault);
        }
        Ok(config)
    }

    fn from_file_or_default(config_file: Option<PathBuf>) -> Result<Self> {
        let explicit = config_file.is_some();
        let path = config_file.or_else(|| Self::default_config_path().ok());

        match path {
            Some(path) if path.exists() => {
                let contents = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read config file: {}", path.display()))?;
                toml::from_str(&contents)
                    .with_context(|| format!("Failed to parse config file: {}", path.display()))
            }
            Some(path) if explicit => {
                anyhow::bail!("Config file not found: {}", path.display())
            }
            _ => Ok(Self::default()),
        }
    }

    /// Get default config file path
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("wxmark");
        Ok(config_dir.join("config.toml"))
    }

    /// Apply command-line render options
    pub fn apply(&mut self, overrides: &RenderOverrides) {
        let render = &mut self.render;
        if let Some(style) = overrides.link_style {
            render.link_style = style.into();
        }
        if let Some(style) = overrides.embed_style {
            render.embed_style = style.into();
        }
        render.enable_empty_line |= overrides.empty_lines;
        render.use_figcaption |= overrides.figcaption;
        render.heading_numbers |= overrides.heading_numbers;
        if overrides.no_line_numbers {
            render.line_number = false;
        }
        if let Some(icons) = &overrides.icons {
            self.icons_dir = Some(icons.clone());
        }
    }

    /// Rendering context for this configuration
    pub fn context(&self) -> RenderContext {
        let mut assets = AssetManager::new();
        if let Some(vault) = &self.vault {
            assets = assets.with_vault(vault);
        }
        if let Some(icons) = &self.icons_dir {
            assets = assets.with_icons_dir(icons);
        }
        RenderContext::new(self.render.clone()).with_assets(assets)
    }

    /// Display the current configuration as TOML
    pub fn display_as_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config as TOML")
    }
}
