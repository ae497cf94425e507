//! File-system memoization keyed by content hash.
//!
//! Every stage that talks to a slow or paid service stores its result under
//! a namespace of the cache root:
//!
//! ```text
//! <cache_dir>/
//!   novels/<sha256(file bytes)>.json
//!   image_analysis/<sha256(image bytes)>.json
//!   music/<sha256(tag key)>.wav
//!   music/<sha256(tag key)>_metadata.json
//!   visualizations/<sha256(sorted keywords)>.png
//!   webtoon/<sha256(url)>/metadata.json + images
//! ```
//!
//! A cache entry that cannot be read or parsed is a miss, never an error.

use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};

pub const NOVELS: &str = "novels";
pub const IMAGE_ANALYSIS: &str = "image_analysis";
pub const MUSIC: &str = "music";
pub const VISUALIZATIONS: &str = "visualizations";
pub const WEBTOON: &str = "webtoon";

/// Hex-encoded SHA-256 of `bytes`.
pub fn content_hash(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Hex-encoded SHA-256 of a string key.
pub fn key_hash(key: &str) -> String {
    content_hash(key.as_bytes())
}

// ---------------------------------------------------------------------------
// DiskCache
// ---------------------------------------------------------------------------

/// Namespaced JSON/blob store rooted at one directory.
#[derive(Debug, Clone)]
pub struct DiskCache {
    root: PathBuf,
}

impl DiskCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory of a namespace. Namespaces may be nested (`webtoon/<hash>`).
    pub fn namespace_dir(&self, namespace: &str) -> PathBuf {
        self.root.join(namespace)
    }

    /// Path of `file_name` inside `namespace`. Does not create anything.
    pub fn path_for(&self, namespace: &str, file_name: &str) -> PathBuf {
        self.namespace_dir(namespace).join(file_name)
    }

    /// Create the namespace directory if needed and return it.
    pub fn ensure_namespace(&self, namespace: &str) -> std::io::Result<PathBuf> {
        let dir = self.namespace_dir(namespace);
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Read `<namespace>/<key>.json`.
    ///
    /// Returns `None` when the entry is absent, unreadable or does not parse
    /// as `T`; the latter two are logged.
    pub fn get_json<T: DeserializeOwned>(&self, namespace: &str, key: &str) -> Option<T> {
        let path = self.path_for(namespace, &format!("{key}.json"));
        if !path.exists() {
            return None;
        }
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) => {
                log::warn!("Cache entry {} unreadable: {e}", path.display());
                return None;
            }
        };
        match serde_json::from_str(&content) {
            Ok(value) => {
                log::debug!("Cache hit: {}", path.display());
                Some(value)
            }
            Err(e) => {
                log::warn!("Cache entry {} is corrupt: {e}", path.display());
                None
            }
        }
    }

    /// Write `<namespace>/<key>.json`, creating the namespace directory.
    pub fn put_json<T: Serialize>(
        &self,
        namespace: &str,
        key: &str,
        value: &T,
    ) -> std::io::Result<PathBuf> {
        let dir = self.ensure_namespace(namespace)?;
        let path = dir.join(format!("{key}.json"));
        let content = serde_json::to_string_pretty(value)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(&path, content)?;
        Ok(path)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
