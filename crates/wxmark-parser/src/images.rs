//! Registry of local images referenced by the article
//!
//! Every local image rendered during a session is recorded here so the
//! publishing step can upload it and swap the local URL for the remote one.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::debug;

/// A local image and, once uploaded, its remote identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInfo {
    /// URL the image is rendered with before publishing
    pub res_url: String,
    /// Absolute path of the image on disk
    pub file_path: PathBuf,
    /// Media ID assigned by the platform
    pub media_id: Option<String>,
    /// Remote URL assigned by the platform
    pub url: Option<String>,
}

impl ImageInfo {
    pub fn local(res_url: impl Into<String>, file_path: impl Into<PathBuf>) -> Self {
        Self {
            res_url: res_url.into(),
            file_path: file_path.into(),
            media_id: None,
            url: None,
        }
    }

    pub fn is_uploaded(&self) -> bool {
        self.url.is_some()
    }
}

#[derive(Debug, Default)]
struct Inner {
    order: Vec<String>,
    by_url: HashMap<String, ImageInfo>,
}

/// Session-wide image registry keyed by the local resource URL
#[derive(Debug, Default)]
pub struct LocalImageRegistry {
    inner: RwLock<Inner>,
}

impl LocalImageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an image. The first registration of a URL wins.
    ///
    /// Returns `true` when the image was newly added.
    pub fn set_image(&self, res_url: &str, info: ImageInfo) -> bool {
        let mut inner = self.inner.write();
        if inner.by_url.contains_key(res_url) {
            return false;
        }
        debug!(res_url, path = %info.file_path.display(), "registered local image");
        inner.order.push(res_url.to_string());
        inner.by_url.insert(res_url.to_string(), info);
        true
    }

    pub fn get(&self, res_url: &str) -> Option<ImageInfo> {
        self.inner.read().by_url.get(res_url).cloned()
    }

    /// All images in registration order
    pub fn images(&self) -> Vec<ImageInfo> {
        let inner = self.inner.read();
        inner
            .order
            .iter()
            .filter_map(|url| inner.by_url.get(url).cloned())
            .collect()
    }

    /// Images that still need uploading
    pub fn pending_uploads(&self) -> Vec<ImageInfo> {
        self.images()
            .into_iter()
            .filter(|info| !info.is_uploaded())
            .collect()
    }

    /// Attach the remote identity returned by the upload.
    ///
    /// Returns `false` if the URL was never registered.
    pub fn mark_uploaded(&self, res_url: &str, media_id: Option<String>, url: String) -> bool {
        let mut inner = self.inner.write();
        match inner.by_url.get_mut(res_url) {
            Some(info) => {
                info.media_id = media_id;
                info.url = Some(url);
                true
            }
            None => false,
        }
    }

    /// Replace every uploaded local URL in `html` with its remote URL
    pub fn apply_uploads(&self, html: &str) -> String {
        let inner = self.inner.read();
        let mut out = html.to_string();
        for res_url in &inner.order {
            if let Some(remote) = inner.by_url.get(res_url).and_then(|i| i.url.as_deref()) {
                out = out.replace(res_url.as_str(), remote);
            }
        }
        out
    }

    pub fn len(&self) -> usize {
        self.inner.read().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut inner = self.inner.write();
        inner.order.clear();
        inner.by_url.clear();
    }
}
