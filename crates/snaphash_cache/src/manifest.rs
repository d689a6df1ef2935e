//! Manifest describing a persisted cache directory.
//!
//! Stored as `manifest.json` in the cache directory. It records which tool
//! version and entry format produced the entries next to it, so a cache
//! written by an incompatible build is discarded instead of consulted.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::entry::ENTRY_FORMAT_VERSION;
use crate::error::CacheError;

/// Name of the manifest file within the cache directory.
pub(crate) const MANIFEST_FILE: &str = "manifest.json";

/// Top-level metadata for a persisted cache directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreManifest {
    /// Tool version that produced this cache. Invalidate on version change.
    pub tool_version: String,

    /// Entry file format version.
    pub format_version: u32,
}

impl StoreManifest {
    /// Creates a manifest for the given tool version and the current entry
    /// format.
    pub fn new(tool_version: &str) -> Self {
        Self {
            tool_version: tool_version.to_string(),
            format_version: ENTRY_FORMAT_VERSION,
        }
    }

    /// Loads the manifest from the cache directory, returning `None` if
    /// the file doesn't exist or can't be parsed.
    ///
    /// This is fail-safe: any error results in `None`, which leads the
    /// caller to start a fresh cache.
    pub fn load(cache_dir: &Path) -> Option<Self> {
        let path = cache_dir.join(MANIFEST_FILE);
        let content = std::fs::read_to_string(&path).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Saves the manifest to the cache directory.
    ///
    /// Creates the cache directory if it doesn't exist.
    pub fn save(&self, cache_dir: &Path) -> Result<(), CacheError> {
        std::fs::create_dir_all(cache_dir).map_err(|e| CacheError::Io {
            path: cache_dir.to_path_buf(),
            source: e,
        })?;
        let path = cache_dir.join(MANIFEST_FILE);
        let json = serde_json::to_string_pretty(self).map_err(|e| CacheError::Serialization {
            reason: e.to_string(),
        })?;
        std::fs::write(&path, json).map_err(|e| CacheError::Io { path, source: e })
    }

    /// Returns `true` if entries described by this manifest can be read by
    /// the given tool version.
    pub fn is_compatible(&self, tool_version: &str) -> bool {
        self.tool_version == tool_version && self.format_version == ENTRY_FORMAT_VERSION
    }
}
