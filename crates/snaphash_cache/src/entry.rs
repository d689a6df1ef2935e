//! On-disk encoding of persisted cache entries.
//!
//! Each entry lives in its own file under `<cache_dir>/entries/`, named by
//! the key digest. A file starts with a 4-byte little-endian header length,
//! then a bincode header (magic bytes, format version, tool version, payload
//! checksum), then the bincode payload. Anything that fails validation reads
//! as a miss.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use snaphash_common::Fingerprint;

use crate::error::CacheError;
use crate::store::{CacheKey, CachedValue};

/// Magic bytes identifying a snaphash entry file.
const ENTRY_MAGIC: [u8; 4] = *b"SNAP";

/// Current entry format version. Increment on breaking changes to
/// the header or payload format.
pub(crate) const ENTRY_FORMAT_VERSION: u32 = 1;

/// Subdirectory holding entry files.
const ENTRIES_SUBDIR: &str = "entries";

/// File extension for entry files.
const ENTRY_EXT: &str = "fp";

/// Header prepended to every entry file for validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct EntryHeader {
    magic: [u8; 4],
    format_version: u32,
    tool_version: String,
    checksum: Fingerprint,
}

/// Entry payload. Carries the full key so that a file reached through a
/// digest collision or a rename is rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct EntryRecord {
    snapshot: Fingerprint,
    configuration: Fingerprint,
    value: CachedValue,
}

/// Reads and writes entry files below a cache directory.
pub(crate) struct EntryFiles {
    dir: PathBuf,
    tool_version: String,
}

impl EntryFiles {
    pub(crate) fn new(cache_dir: &Path, tool_version: &str) -> Self {
        Self {
            dir: cache_dir.join(ENTRIES_SUBDIR),
            tool_version: tool_version.to_string(),
        }
    }

    fn ensure_dir(&self) -> Result<(), CacheError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| CacheError::Io {
            path: self.dir.clone(),
            source: e,
        })
    }

    pub(crate) fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(format!("{}.{ENTRY_EXT}", key.digest()))
    }

    /// Writes the entry for `key`, replacing any existing file.
    pub(crate) fn write(&self, key: &CacheKey, value: CachedValue) -> Result<(), CacheError> {
        self.ensure_dir()?;

        let record = EntryRecord {
            snapshot: key.snapshot(),
            configuration: key.configuration(),
            value,
        };
        let payload = bincode::serde::encode_to_vec(&record, bincode::config::standard())
            .map_err(|e| CacheError::Serialization {
                reason: e.to_string(),
            })?;

        let header = EntryHeader {
            magic: ENTRY_MAGIC,
            format_version: ENTRY_FORMAT_VERSION,
            tool_version: self.tool_version.clone(),
            checksum: Fingerprint::from_bytes(&payload),
        };
        let header_bytes = bincode::serde::encode_to_vec(&header, bincode::config::standard())
            .map_err(|e| CacheError::Serialization {
                reason: e.to_string(),
            })?;

        let header_len =
            u32::try_from(header_bytes.len()).map_err(|_| CacheError::Serialization {
                reason: format!("entry header of {} bytes is too large", header_bytes.len()),
            })?;
        let mut output = Vec::with_capacity(4 + header_bytes.len() + payload.len());
        output.extend_from_slice(&header_len.to_le_bytes());
        output.extend_from_slice(&header_bytes);
        output.extend_from_slice(&payload);

        let path = self.entry_path(key);
        std::fs::write(&path, &output).map_err(|e| CacheError::Io { path, source: e })
    }

    /// Reads the entry for `key`.
    ///
    /// Returns `None` if the file doesn't exist, the header is invalid, the
    /// versions don't match, the checksum doesn't verify, or the stored key
    /// differs. Corruption is a miss, never an error.
    pub(crate) fn read(&self, key: &CacheKey) -> Option<CachedValue> {
        let raw = std::fs::read(self.entry_path(key)).ok()?;

        if raw.len() < 4 {
            return None;
        }
        let header_len = u32::from_le_bytes(raw[..4].try_into().ok()?) as usize;
        if raw.len() < 4 + header_len {
            return None;
        }

        let header: EntryHeader =
            bincode::serde::decode_from_slice(&raw[4..4 + header_len], bincode::config::standard())
                .ok()?
                .0;
        if header.magic != ENTRY_MAGIC
            || header.format_version != ENTRY_FORMAT_VERSION
            || header.tool_version != self.tool_version
        {
            return None;
        }

        let payload = &raw[4 + header_len..];
        if Fingerprint::from_bytes(payload) != header.checksum {
            return None;
        }

        let record: EntryRecord =
            bincode::serde::decode_from_slice(payload, bincode::config::standard())
                .ok()?
                .0;
        if record.snapshot != key.snapshot() || record.configuration != key.configuration() {
            return None;
        }
        Some(record.value)
    }

    /// Lists the digests of all entry files present.
    pub(crate) fn digests(&self) -> Result<Vec<Fingerprint>, CacheError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let entries = std::fs::read_dir(&self.dir).map_err(|e| CacheError::Io {
            path: self.dir.clone(),
            source: e,
        })?;

        let mut digests = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| CacheError::Io {
                path: self.dir.clone(),
                source: e,
            })?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(ENTRY_EXT) {
                continue;
            }
            if let Some(digest) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.parse().ok())
            {
                digests.push(digest);
            }
        }
        digests.sort();
        Ok(digests)
    }

    /// Removes entry files whose digest is not in `live`. Returns the number
    /// of files removed.
    pub(crate) fn gc(&self, live: &HashSet<Fingerprint>) -> Result<usize, CacheError> {
        let mut removed = 0;
        for digest in self.digests()? {
            if !live.contains(&digest) {
                let path = self.dir.join(format!("{digest}.{ENTRY_EXT}"));
                std::fs::remove_file(&path).map_err(|e| CacheError::Io { path, source: e })?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Removes every entry file.
    pub(crate) fn clear(&self) -> Result<usize, CacheError> {
        self.gc(&HashSet::new())
    }
}
