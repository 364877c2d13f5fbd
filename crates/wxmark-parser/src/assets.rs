//! Asset lookup: icons, vault files and local resource URLs

use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{RenderError, RenderResult};

/// A vault file together with the URL it is rendered with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourcePath {
    pub res_url: String,
    pub file_path: PathBuf,
}

/// Resolves icons, notes and images referenced from Markdown
#[derive(Debug)]
pub struct AssetManager {
    vault_root: Option<PathBuf>,
    icons_dir: Option<PathBuf>,
    resource_prefix: String,
    icons: RwLock<HashMap<String, String>>,
}

impl Default for AssetManager {
    fn default() -> Self {
        Self {
            vault_root: None,
            icons_dir: None,
            resource_prefix: "file://".to_string(),
            icons: RwLock::new(HashMap::new()),
        }
    }
}

impl AssetManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_vault(mut self, root: impl Into<PathBuf>) -> Self {
        self.vault_root = Some(root.into());
        self
    }

    pub fn with_icons_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.icons_dir = Some(dir.into());
        self
    }

    /// Prefix prepended to encoded absolute paths (defaults to `file://`)
    pub fn with_resource_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.resource_prefix = prefix.into();
        self
    }

    pub fn vault_root(&self) -> Option<&Path> {
        self.vault_root.as_deref()
    }

    /// Register an icon by name, shadowing any icon file of the same name
    pub fn register_icon(&self, name: impl Into<String>, svg: impl Into<String>) {
        self.icons.write().insert(name.into(), svg.into());
    }

    /// Look up an icon's SVG markup by name.
    ///
    /// Returns an empty string when the icon does not exist.
    pub fn load_icon(&self, name: &str) -> String {
        if let Some(svg) = self.icons.read().get(name) {
            return svg.clone();
        }

        let Some(dir) = &self.icons_dir else {
            return String::new();
        };
        if !is_plain_name(name) {
            debug!(name, "rejected icon name");
            return String::new();
        }

        let path = dir.join(format!("{}.svg", name));
        match std::fs::read_to_string(&path) {
            Ok(svg) => {
                self.icons.write().insert(name.to_string(), svg.clone());
                svg
            }
            Err(e) => {
                debug!(name, error = %e, "icon not found");
                String::new()
            }
        }
    }

    /// Find a file in the vault by link text.
    ///
    /// Tries the path relative to the vault root first, then the same path
    /// with an `.md` extension, then any file with that name anywhere in
    /// the vault.
    pub fn find_file(&self, link: &str) -> Option<PathBuf> {
        let root = self.vault_root.as_ref()?;
        let link = link.trim().trim_start_matches('/');
        if link.is_empty() || !is_relative_inside(Path::new(link)) {
            return None;
        }

        let direct = root.join(link);
        if direct.is_file() {
            return Some(direct);
        }
        if Path::new(link).extension().is_none() {
            let note = root.join(format!("{}.md", link));
            if note.is_file() {
                return Some(note);
            }
        }

        let name = Path::new(link).file_name()?.to_string_lossy().into_owned();
        let mut candidates = vec![name.clone()];
        if Path::new(&name).extension().is_none() {
            candidates.push(format!("{}.md", name));
        }

        for candidate in candidates {
            let pattern = format!(
                "{}/**/{}",
                glob::Pattern::escape(&root.to_string_lossy()),
                glob::Pattern::escape(&candidate)
            );
            let Ok(entries) = glob::glob(&pattern) else {
                continue;
            };
            let mut found: Vec<PathBuf> = entries.filter_map(Result::ok).filter(|p| p.is_file()).collect();
            found.sort();
            if let Some(path) = found.into_iter().next() {
                return Some(path);
            }
        }
        None
    }

    /// Resolve a local image path to its renderable URL
    pub fn get_resource_path(&self, local: &str) -> Option<ResourcePath> {
        let file_path = self.find_file(local)?;
        let res_url = format!("{}{}", self.resource_prefix, encode_path(&file_path));
        Some(ResourcePath { res_url, file_path })
    }

    /// Read a note from the vault
    pub fn read_note(&self, link: &str) -> RenderResult<(PathBuf, String)> {
        let path = self
            .find_file(link)
            .ok_or_else(|| RenderError::Asset(format!("note not found: {}", link)))?;
        let content = std::fs::read_to_string(&path).map_err(|e| {
            warn!(path = %path.display(), error = %e, "failed to read note");
            RenderError::Io(e)
        })?;
        Ok((path, content))
    }
}

fn is_plain_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(['/', '\\']) && name != "." && name != ".."
}

fn is_relative_inside(path: &Path) -> bool {
    path.components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

fn encode_path(path: &Path) -> String {
    path.to_string_lossy()
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
