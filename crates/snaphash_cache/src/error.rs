//! Error types for hashing and cache operations.

use std::path::PathBuf;

/// Errors that can occur while hashing snapshots or accessing a cache store.
///
/// Content-read failures and storage failures are kept apart: the first
/// comes from the snapshot being hashed, the second from the cache backend.
/// Neither is ever memoized as a result.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// The content behind a snapshot could not be read.
    #[error("failed to read content of {path}: {source}")]
    ContentRead {
        /// The location whose content was being read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// An I/O error occurred while reading or writing cache files.
    #[error("cache I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A cache entry or manifest could not be serialized.
    #[error("serialization error: {reason}")]
    Serialization {
        /// Description of the serialization failure.
        reason: String,
    },
}

impl CacheError {
    /// Returns `true` if the error came from reading snapshot content rather
    /// than from the cache backend.
    pub fn is_content_read(&self) -> bool {
        matches!(self, CacheError::ContentRead { .. })
    }

    /// Rebuilds an equivalent error for a caller that shared a failed
    /// computation. `io::Error` is not `Clone`, so sources keep their kind
    /// and message only.
    pub(crate) fn duplicate(&self) -> Self {
        let copy_io = |e: &std::io::Error| std::io::Error::new(e.kind(), e.to_string());
        match self {
            CacheError::ContentRead { path, source } => CacheError::ContentRead {
                path: path.clone(),
                source: copy_io(source),
            },
            CacheError::Io { path, source } => CacheError::Io {
                path: path.clone(),
                source: copy_io(source),
            },
            CacheError::Serialization { reason } => CacheError::Serialization {
                reason: reason.clone(),
            },
        }
    }
}
