//! Persisted cache store.
//!
//! [`PersistentCacheStore`] writes every computed entry through to disk and
//! consults disk on an in-memory miss, so fingerprints survive process
//! restarts. All lookups go through an [`InMemoryCacheStore`], which is what
//! keeps computation at most once per key within a process.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use snaphash_common::Fingerprint;
use tracing::{debug, info, warn};

use crate::entry::EntryFiles;
use crate::error::CacheError;
use crate::manifest::StoreManifest;
use crate::store::{CacheKey, CacheStats, CacheStore, CachedValue, InMemoryCacheStore};

/// A [`CacheStore`] backed by a directory of entry files.
///
/// Eviction is never automatic; callers decide what to keep through
/// [`PersistentCacheStore::gc`].
pub struct PersistentCacheStore {
    cache_dir: PathBuf,
    memory: InMemoryCacheStore,
    files: EntryFiles,
    disk_hits: AtomicU64,
}

impl PersistentCacheStore {
    /// Opens the cache in `cache_dir`, creating it if needed.
    ///
    /// If the directory holds a cache written by a different tool version or
    /// entry format, or its manifest is unreadable, existing entries are
    /// discarded and a fresh manifest is written.
    pub fn open(cache_dir: &Path, tool_version: &str) -> Result<Self, CacheError> {
        let files = EntryFiles::new(cache_dir, tool_version);

        match StoreManifest::load(cache_dir) {
            Some(m) if m.is_compatible(tool_version) => {
                debug!(dir = %cache_dir.display(), "opened existing fingerprint cache");
            }
            previous => {
                if let Some(m) = previous {
                    warn!(
                        dir = %cache_dir.display(),
                        found = %m.tool_version,
                        expected = %tool_version,
                        "discarding incompatible fingerprint cache"
                    );
                }
                let removed = files.clear()?;
                StoreManifest::new(tool_version).save(cache_dir)?;
                info!(dir = %cache_dir.display(), removed, "initialized fingerprint cache");
            }
        }

        Ok(Self {
            cache_dir: cache_dir.to_path_buf(),
            memory: InMemoryCacheStore::new(),
            files,
            disk_hits: AtomicU64::new(0),
        })
    }

    /// Root directory of this cache.
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Lookup counters for this process. A lookup answered from disk counts
    /// as a miss here and as a [`disk_hits`](Self::disk_hits) hit.
    pub fn stats(&self) -> CacheStats {
        self.memory.stats()
    }

    /// Number of in-memory misses that were answered from an entry file.
    pub fn disk_hits(&self) -> u64 {
        self.disk_hits.load(Ordering::Relaxed)
    }

    /// Number of entry files on disk.
    pub fn entry_count(&self) -> Result<usize, CacheError> {
        Ok(self.files.digests()?.len())
    }

    /// Removes every persisted entry whose key is not in `live_keys`, and
    /// forgets the same keys in memory. Returns the number of files removed.
    pub fn gc(&self, live_keys: &[CacheKey]) -> Result<usize, CacheError> {
        let live: HashSet<Fingerprint> = live_keys.iter().map(CacheKey::digest).collect();
        let removed = self.files.gc(&live)?;
        self.memory.retain(|key| live.contains(&key.digest()));
        info!(removed, kept = live.len(), "garbage-collected fingerprint cache");
        Ok(removed)
    }
}

impl CacheStore for PersistentCacheStore {
    fn get_or_compute<F>(&self, key: CacheKey, compute: F) -> Result<CachedValue, CacheError>
    where
        F: FnOnce() -> Result<CachedValue, CacheError>,
    {
        self.memory.get_or_compute(key, || {
            if let Some(value) = self.files.read(&key) {
                self.disk_hits.fetch_add(1, Ordering::Relaxed);
                debug!(?key, "loaded fingerprint from disk");
                return Ok(value);
            }
            let value = compute()?;
            self.files.write(&key, value)?;
            Ok(value)
        })
    }
}
