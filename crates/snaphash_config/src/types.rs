//! Configuration types deserialized from `snaphash.toml`.

use serde::Deserialize;

/// Default location of the persisted fingerprint cache, relative to the
/// directory the tool runs in.
pub const DEFAULT_CACHE_DIR: &str = ".snaphash";

/// The top-level configuration parsed from `snaphash.toml`.
///
/// Every field has a default, so an empty file is a valid configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HashingConfig {
    /// Rules applied to content before it is hashed.
    #[serde(default)]
    pub normalization: NormalizationConfig,
    /// Where and how fingerprints are cached.
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Normalization rules. Every field here changes the fingerprints produced
/// for the same content, so all of them feed the configuration fingerprint.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NormalizationConfig {
    /// How line endings in text files are treated.
    #[serde(default)]
    pub line_endings: LineEndings,
    /// Glob patterns for files that are excluded from hashing.
    #[serde(default)]
    pub ignore: Vec<String>,
}

/// Line-ending treatment for text content.
#[derive(Debug, Default, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LineEndings {
    /// Hash bytes exactly as stored (default).
    #[default]
    Preserve,
    /// Rewrite `\r\n` and lone `\r` to `\n` before hashing text files.
    Normalize,
}

/// Cache settings. These affect performance only and never feed the
/// configuration fingerprint.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// Directory holding the persisted cache.
    #[serde(default = "default_cache_dir")]
    pub dir: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: default_cache_dir(),
        }
    }
}

fn default_cache_dir() -> String {
    DEFAULT_CACHE_DIR.to_string()
}
