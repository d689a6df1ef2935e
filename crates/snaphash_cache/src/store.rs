//! Cache keys, cached values, and the get-or-compute store contract.
//!
//! [`InMemoryCacheStore`] is the reference store. It keeps a slot per key
//! that is either `Pending` (a caller is computing it) or `Ready`. Callers
//! that find a pending slot park on a condition variable until the computing
//! caller settles it, then share its outcome: a value or the same failure.
//! A failure is not stored, so the next lookup after it computes again.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};
use snaphash_common::{Fingerprint, Hasher};
use tracing::{debug, trace};

use crate::configuration::ConfigurationFingerprint;
use crate::error::CacheError;

/// Identifies one cached fingerprint: what was hashed and how.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    snapshot: Fingerprint,
    configuration: Fingerprint,
}

impl CacheKey {
    /// Pairs a snapshot identity with the configuration it is hashed under.
    pub fn new(snapshot: Fingerprint, configuration: ConfigurationFingerprint) -> Self {
        Self {
            snapshot,
            configuration: configuration.fingerprint(),
        }
    }

    /// The snapshot identity half of the key.
    pub fn snapshot(&self) -> Fingerprint {
        self.snapshot
    }

    /// The configuration half of the key.
    pub fn configuration(&self) -> Fingerprint {
        self.configuration
    }

    /// Folds both halves into a single fingerprint, configuration first.
    ///
    /// Used wherever a key needs a flat name, such as persisted entry files.
    pub fn digest(&self) -> Fingerprint {
        let mut hasher = Hasher::new();
        hasher.put_fingerprint(&self.configuration);
        hasher.put_fingerprint(&self.snapshot);
        hasher.finish()
    }
}

/// A memoized hashing outcome.
///
/// `NotHashable` is a tombstone: the delegate was asked and answered that
/// the snapshot has no fingerprint. It is distinct from having no entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CachedValue {
    /// The computed fingerprint.
    Hashed(Fingerprint),
    /// The snapshot is not eligible for hashing.
    NotHashable,
}

impl From<Option<Fingerprint>> for CachedValue {
    fn from(value: Option<Fingerprint>) -> Self {
        match value {
            Some(fp) => CachedValue::Hashed(fp),
            None => CachedValue::NotHashable,
        }
    }
}

impl From<CachedValue> for Option<Fingerprint> {
    fn from(value: CachedValue) -> Self {
        match value {
            CachedValue::Hashed(fp) => Some(fp),
            CachedValue::NotHashable => None,
        }
    }
}

/// A key-value store with get-or-compute semantics.
///
/// Implementations guarantee that `compute` runs at most once per key among
/// concurrent callers; the others wait for and share its outcome. A failed
/// `compute` is never stored, so the next lookup computes again.
pub trait CacheStore: Send + Sync {
    /// Returns the value stored under `key`, computing and storing it first
    /// if there is none.
    fn get_or_compute<F>(&self, key: CacheKey, compute: F) -> Result<CachedValue, CacheError>
    where
        F: FnOnce() -> Result<CachedValue, CacheError>;
}

/// Counters describing how lookups were answered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from a ready entry.
    pub hits: u64,
    /// Lookups that ran `compute`.
    pub misses: u64,
    /// Times a lookup parked behind another caller's computation.
    pub waits: u64,
}

/// One computation of a key. Callers that waited on it read its outcome
/// here, even after the slot itself has been cleared.
#[derive(Default)]
struct Attempt {
    outcome: Mutex<Option<Result<CachedValue, CacheError>>>,
}

enum Slot {
    Pending(Arc<Attempt>),
    Ready(CachedValue),
}

/// What a lookup found while holding the slot lock.
enum Lookup {
    Ready(CachedValue),
    Pending(Arc<Attempt>),
    Vacant,
}

/// In-process [`CacheStore`] backed by a mutex-guarded map.
#[derive(Default)]
pub struct InMemoryCacheStore {
    slots: Mutex<HashMap<CacheKey, Slot>>,
    settled: Condvar,
    hits: AtomicU64,
    misses: AtomicU64,
    waits: AtomicU64,
}

impl InMemoryCacheStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the ready value for `key` without computing anything.
    pub fn get(&self, key: &CacheKey) -> Option<CachedValue> {
        match self.slots.lock().get(key) {
            Some(Slot::Ready(value)) => Some(*value),
            _ => None,
        }
    }

    /// Number of ready entries.
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .values()
            .filter(|slot| matches!(slot, Slot::Ready(_)))
            .count()
    }

    /// Returns `true` if no entry is ready.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops ready entries whose key `keep` rejects. In-flight keys are left
    /// to their computing callers.
    pub fn retain(&self, mut keep: impl FnMut(&CacheKey) -> bool) {
        self.slots
            .lock()
            .retain(|key, slot| matches!(slot, Slot::Pending(_)) || keep(key));
    }

    /// Current lookup counters.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            waits: self.waits.load(Ordering::Relaxed),
        }
    }
}

/// Clears a pending slot if the computing caller unwinds before settling it,
/// so waiters wake up and one of them takes over.
struct PendingGuard<'a> {
    store: &'a InMemoryCacheStore,
    key: CacheKey,
    armed: bool,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.store.slots.lock().remove(&self.key);
            self.store.settled.notify_all();
        }
    }
}

impl CacheStore for InMemoryCacheStore {
    fn get_or_compute<F>(&self, key: CacheKey, compute: F) -> Result<CachedValue, CacheError>
    where
        F: FnOnce() -> Result<CachedValue, CacheError>,
    {
        let mut slots = self.slots.lock();
        let mut awaited: Option<Arc<Attempt>> = None;
        loop {
            if let Some(attempt) = &awaited {
                match &*attempt.outcome.lock() {
                    Some(Ok(value)) => {
                        self.hits.fetch_add(1, Ordering::Relaxed);
                        return Ok(*value);
                    }
                    Some(Err(e)) => {
                        trace!(?key, "in-flight computation failed");
                        return Err(e.duplicate());
                    }
                    // Abandoned: fall through and look at the slot again.
                    None => {}
                }
            }

            let lookup = match slots.get(&key) {
                Some(Slot::Ready(value)) => Lookup::Ready(*value),
                Some(Slot::Pending(attempt)) => Lookup::Pending(Arc::clone(attempt)),
                None => Lookup::Vacant,
            };
            match lookup {
                Lookup::Ready(value) => {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    trace!(?key, "cache hit");
                    return Ok(value);
                }
                Lookup::Pending(attempt) => {
                    if !awaited.as_ref().is_some_and(|a| Arc::ptr_eq(a, &attempt)) {
                        self.waits.fetch_add(1, Ordering::Relaxed);
                        trace!(?key, "waiting for in-flight computation");
                        awaited = Some(attempt);
                    }
                    self.settled.wait(&mut slots);
                }
                Lookup::Vacant => break,
            }
        }
        let attempt = Arc::new(Attempt::default());
        slots.insert(key, Slot::Pending(Arc::clone(&attempt)));
        drop(slots);

        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!(?key, "cache miss, computing");
        let mut guard = PendingGuard {
            store: self,
            key,
            armed: true,
        };
        let result = compute();

        let mut slots = self.slots.lock();
        match &result {
            Ok(value) => {
                slots.insert(key, Slot::Ready(*value));
                *attempt.outcome.lock() = Some(Ok(*value));
            }
            Err(e) => {
                debug!(?key, error = %e, "computation failed, not caching");
                slots.remove(&key);
                *attempt.outcome.lock() = Some(Err(e.duplicate()));
            }
        }
        guard.armed = false;
        drop(slots);
        self.settled.notify_all();
        result
    }
}
