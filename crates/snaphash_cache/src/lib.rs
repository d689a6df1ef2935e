//! Configuration-versioned memoization of snapshot fingerprints.
//!
//! This crate fingerprints file-system snapshots and caches the results so
//! that unchanged content hashed under an unchanged policy is never hashed
//! twice. Cache keys pair the snapshot's identity with a fingerprint of the
//! hashing configuration, so a policy change can never be answered with a
//! stale result.

#![warn(missing_docs)]

pub mod caching;
pub mod configuration;
mod entry;
pub mod error;
pub mod hasher;
pub mod manifest;
pub mod persistent;
pub mod snapshot;
pub mod store;

pub use caching::CachingSnapshotHasher;
pub use configuration::ConfigurationFingerprint;
pub use error::CacheError;
pub use hasher::{ContentSnapshotHasher, SnapshotHasher};
pub use manifest::StoreManifest;
pub use persistent::PersistentCacheStore;
pub use snapshot::{FileSystemLocationSnapshot, SnapshotKind, Snapshotter};
pub use store::{CacheKey, CacheStats, CacheStore, CachedValue, InMemoryCacheStore};
