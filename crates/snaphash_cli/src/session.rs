//! Shared setup for commands: configuration, policy and cache location.

use std::path::{Path, PathBuf};

use snaphash_cache::{FileSystemLocationSnapshot, PersistentCacheStore, Snapshotter};
use snaphash_config::{
    load_config_from_str, load_config_or_default, resolve_policy, HashingConfig, ResolvedPolicy,
};
use tracing::debug;

use crate::GlobalArgs;

/// Version stamped into the cache manifest.
pub const TOOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Loaded configuration plus the hashing policy resolved from it.
pub struct Session {
    /// The raw configuration.
    pub config: HashingConfig,
    /// Compiled normalization policy.
    pub policy: ResolvedPolicy,
}

impl Session {
    /// Loads `--config` if given, otherwise `snaphash.toml` in the current
    /// directory, falling back to defaults when that file is absent.
    pub fn load(global: &GlobalArgs) -> Result<Self, Box<dyn std::error::Error>> {
        let config = match &global.config {
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
                load_config_from_str(&content)?
            }
            None => load_config_or_default(&std::env::current_dir()?)?,
        };
        let policy = resolve_policy(&config)?;
        debug!(
            normalize = policy.normalizes_line_endings(),
            ignore = policy.ignore_patterns().count(),
            "resolved hashing policy"
        );
        Ok(Self { config, policy })
    }

    /// Cache directory: the override if present, else `cache.dir`.
    pub fn cache_dir(&self, cache_dir: Option<&Path>) -> PathBuf {
        cache_dir
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(&self.config.cache.dir))
    }

    /// Opens the persisted store at [`cache_dir`](Self::cache_dir).
    pub fn open_store(
        &self,
        cache_dir: Option<&Path>,
    ) -> Result<PersistentCacheStore, Box<dyn std::error::Error>> {
        Ok(PersistentCacheStore::open(&self.cache_dir(cache_dir), TOOL_VERSION)?)
    }
}

/// Snapshots every root in order, leaving out the cache directory so the
/// cache never fingerprints its own entries.
pub fn snapshot_roots(
    paths: &[PathBuf],
    cache_dir: &Path,
) -> Result<Vec<FileSystemLocationSnapshot>, Box<dyn std::error::Error>> {
    let excluded = [cache_dir.to_path_buf()];
    paths
        .iter()
        .map(|p| Snapshotter::snapshot_excluding(p, &excluded).map_err(Into::into))
        .collect()
}
