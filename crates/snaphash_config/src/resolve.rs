//! Policy resolution: turning a parsed configuration into the form the
//! content hasher consumes.

use crate::error::ConfigError;
use crate::types::{HashingConfig, LineEndings};
use glob::Pattern;

/// A fully resolved hashing policy with compiled ignore patterns.
///
/// Patterns are sorted and de-duplicated so that two configurations listing
/// the same set of patterns in different orders resolve to equal policies.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResolvedPolicy {
    /// Line-ending treatment for text content.
    pub line_endings: LineEndings,
    ignore: Vec<Pattern>,
}

impl ResolvedPolicy {
    /// Creates a policy from a line-ending mode and raw ignore patterns.
    ///
    /// Patterns are matched against file names, so they may not contain a
    /// path separator.
    pub fn new<I, S>(line_endings: LineEndings, ignore: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut compiled = Vec::new();
        for raw in ignore {
            let raw = raw.as_ref();
            if raw.contains('/') {
                return Err(ConfigError::ValidationError(format!(
                    "ignore pattern '{raw}' must match a file name and cannot contain '/'"
                )));
            }
            let pattern = Pattern::new(raw).map_err(|e| ConfigError::InvalidPattern {
                pattern: raw.to_string(),
                reason: e.msg.to_string(),
            })?;
            compiled.push(pattern);
        }
        compiled.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        compiled.dedup_by(|a, b| a.as_str() == b.as_str());
        Ok(Self {
            line_endings,
            ignore: compiled,
        })
    }

    /// Returns `true` when line endings are normalized before hashing.
    pub fn normalizes_line_endings(&self) -> bool {
        self.line_endings == LineEndings::Normalize
    }

    /// Iterates the ignore patterns in their canonical (sorted) order.
    pub fn ignore_patterns(&self) -> impl Iterator<Item = &str> {
        self.ignore.iter().map(Pattern::as_str)
    }

    /// Returns `true` if the file name matches any ignore pattern.
    pub fn is_ignored(&self, file_name: &str) -> bool {
        self.ignore.iter().any(|pattern| pattern.matches(file_name))
    }
}

/// Resolves a parsed configuration into a [`ResolvedPolicy`].
pub fn resolve_policy(config: &HashingConfig) -> Result<ResolvedPolicy, ConfigError> {
    ResolvedPolicy::new(
        config.normalization.line_endings,
        &config.normalization.ignore,
    )
}
