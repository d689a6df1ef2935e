//! Content hashing of snapshots under a normalization policy.
//!
//! [`SnapshotHasher`] is the capability the rest of the crate is written
//! against; [`ContentSnapshotHasher`] is the reference implementation that
//! reads file content and applies a [`ResolvedPolicy`].

use std::borrow::Cow;
use std::io;

use snaphash_common::{Fingerprint, Hasher};
use snaphash_config::ResolvedPolicy;

use crate::error::CacheError;
use crate::snapshot::FileSystemLocationSnapshot;

/// Computes fingerprints for snapshots.
///
/// Implementations must be deterministic: the same snapshot under the same
/// configuration always yields the same result.
pub trait SnapshotHasher: Send + Sync {
    /// Appends every piece of state that can change this hasher's output.
    ///
    /// Values must be appended in a fixed order so that two logically
    /// identical configurations accumulate to the same fingerprint.
    fn append_configuration(&self, hasher: &mut Hasher);

    /// Fingerprints the snapshot's content without any caching.
    ///
    /// Returns `Ok(None)` when the snapshot is not eligible for hashing under
    /// this hasher's policy. Failures to read content are returned as
    /// [`CacheError::ContentRead`].
    fn hash(&self, snapshot: &FileSystemLocationSnapshot)
        -> Result<Option<Fingerprint>, CacheError>;
}

/// Tag identifying the hashing algorithm. Bump the suffix whenever the way
/// content is turned into a fingerprint changes.
const CONTENT_HASHER_TAG: &str = "snaphash.ContentSnapshotHasher/1";

/// Number of leading bytes inspected when deciding whether content is text.
const TEXT_SNIFF_LEN: usize = 8 * 1024;

/// Hashes regular-file content, applying line-ending normalization and
/// ignore patterns from a [`ResolvedPolicy`].
///
/// Directories and missing locations are not hashable. A file whose bytes
/// no longer match the snapshot's content hash is a
/// [`CacheError::ContentRead`].
#[derive(Debug, Clone)]
pub struct ContentSnapshotHasher {
    policy: ResolvedPolicy,
}

impl ContentSnapshotHasher {
    /// Creates a hasher for the given policy.
    pub fn new(policy: ResolvedPolicy) -> Self {
        Self { policy }
    }

    /// The policy this hasher applies.
    pub fn policy(&self) -> &ResolvedPolicy {
        &self.policy
    }

    fn fingerprint_content(&self, content: &[u8]) -> Fingerprint {
        if self.policy.normalizes_line_endings() && looks_like_text(content) {
            Fingerprint::from_bytes(&normalize_line_endings(content))
        } else {
            Fingerprint::from_bytes(content)
        }
    }
}

impl SnapshotHasher for ContentSnapshotHasher {
    fn append_configuration(&self, hasher: &mut Hasher) {
        hasher.put_str(CONTENT_HASHER_TAG);
        hasher.put_bool(self.policy.normalizes_line_endings());
        let patterns: Vec<&str> = self.policy.ignore_patterns().collect();
        hasher.put_len(patterns.len());
        for pattern in patterns {
            hasher.put_str(pattern);
        }
    }

    fn hash(
        &self,
        snapshot: &FileSystemLocationSnapshot,
    ) -> Result<Option<Fingerprint>, CacheError> {
        let FileSystemLocationSnapshot::RegularFile(_) = snapshot else {
            return Ok(None);
        };
        if self.policy.is_ignored(snapshot.name()) {
            return Ok(None);
        }
        let content = std::fs::read(snapshot.path()).map_err(|e| CacheError::ContentRead {
            path: snapshot.path().to_path_buf(),
            source: e,
        })?;
        // The result is keyed by the captured content, so it must describe it.
        if snapshot.content_hash() != Some(Fingerprint::from_bytes(&content)) {
            return Err(CacheError::ContentRead {
                path: snapshot.path().to_path_buf(),
                source: io::Error::new(
                    io::ErrorKind::InvalidData,
                    "content changed since snapshot",
                ),
            });
        }
        Ok(Some(self.fingerprint_content(&content)))
    }
}

/// Content is treated as text unless a NUL byte appears near the start.
fn looks_like_text(content: &[u8]) -> bool {
    let head = &content[..content.len().min(TEXT_SNIFF_LEN)];
    !head.contains(&0)
}

/// Rewrites `\r\n` and lone `\r` to `\n`.
fn normalize_line_endings(content: &[u8]) -> Cow<'_, [u8]> {
    if !content.contains(&b'\r') {
        return Cow::Borrowed(content);
    }
    let mut out = Vec::with_capacity(content.len());
    let mut bytes = content.iter().copied().peekable();
    while let Some(b) = bytes.next() {
        if b == b'\r' {
            if bytes.peek() == Some(&b'\n') {
                bytes.next();
            }
            out.push(b'\n');
        } else {
            out.push(b);
        }
    }
    Cow::Owned(out)
}
