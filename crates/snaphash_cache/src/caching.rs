//! Memoizing decorator around a [`SnapshotHasher`].

use std::sync::Arc;

use snaphash_common::{Fingerprint, Hasher};
use tracing::trace;

use crate::configuration::ConfigurationFingerprint;
use crate::error::CacheError;
use crate::hasher::SnapshotHasher;
use crate::snapshot::FileSystemLocationSnapshot;
use crate::store::{CacheKey, CacheStore, CachedValue};

/// A [`SnapshotHasher`] that answers repeated requests from a [`CacheStore`].
///
/// The delegate's configuration fingerprint is computed once, at
/// construction, and becomes half of every cache key. Two instances whose
/// delegates are configured differently can share one store without ever
/// seeing each other's entries.
///
/// A caching hasher must not wrap another caching hasher over the same
/// store: both derive the same key, and the outer lookup would wait on the
/// inner one forever.
pub struct CachingSnapshotHasher<H, S> {
    delegate: H,
    store: Arc<S>,
    configuration: ConfigurationFingerprint,
}

impl<H, S> CachingSnapshotHasher<H, S>
where
    H: SnapshotHasher,
    S: CacheStore,
{
    /// Wraps `delegate`, caching its results in `store`.
    pub fn new(delegate: H, store: Arc<S>) -> Self {
        let configuration = ConfigurationFingerprint::of(&delegate);
        trace!(%configuration, "caching snapshot hasher configured");
        Self {
            delegate,
            store,
            configuration,
        }
    }

    /// Fingerprint of the delegate's configuration, fixed for this instance.
    pub fn configuration_fingerprint(&self) -> ConfigurationFingerprint {
        self.configuration
    }

    /// The cache key this instance uses for `snapshot`.
    pub fn cache_key(&self, snapshot: &FileSystemLocationSnapshot) -> CacheKey {
        CacheKey::new(snapshot.identity(), self.configuration)
    }

    /// The wrapped hasher.
    pub fn delegate(&self) -> &H {
        &self.delegate
    }

    /// The backing store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }
}

impl<H, S> SnapshotHasher for CachingSnapshotHasher<H, S>
where
    H: SnapshotHasher,
    S: CacheStore,
{
    /// Forwards to the delegate. Caching does not change what a fingerprint
    /// means, so it contributes nothing here.
    fn append_configuration(&self, hasher: &mut Hasher) {
        self.delegate.append_configuration(hasher);
    }

    fn hash(
        &self,
        snapshot: &FileSystemLocationSnapshot,
    ) -> Result<Option<Fingerprint>, CacheError> {
        let key = self.cache_key(snapshot);
        self.store
            .get_or_compute(key, || {
                self.delegate.hash(snapshot).map(CachedValue::from)
            })
            .map(Option::from)
    }
}
