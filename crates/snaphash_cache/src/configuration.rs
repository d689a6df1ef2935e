//! Fingerprint of a hasher's configuration.

use std::fmt;

use snaphash_common::{Fingerprint, Hasher};

use crate::hasher::SnapshotHasher;

/// Summary of every configurable decision that affects how a
/// [`SnapshotHasher`] turns content into fingerprints.
///
/// Embedded in every cache key, so a policy change can never be answered
/// from entries computed under the old policy.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConfigurationFingerprint(Fingerprint);

impl ConfigurationFingerprint {
    /// Accumulates the hasher's configuration into a fresh [`Hasher`].
    pub fn of<H: SnapshotHasher + ?Sized>(hasher: &H) -> Self {
        let mut acc = Hasher::new();
        hasher.append_configuration(&mut acc);
        Self(acc.finish())
    }

    /// The underlying fingerprint.
    pub fn fingerprint(&self) -> Fingerprint {
        self.0
    }
}

impl fmt::Display for ConfigurationFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::Debug for ConfigurationFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConfigurationFingerprint({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CacheError;
    use crate::snapshot::FileSystemLocationSnapshot;

    struct Tagged(&'static str);

    impl SnapshotHasher for Tagged {
        fn append_configuration(&self, hasher: &mut Hasher) {
            hasher.put_str(self.0);
        }

        fn hash(
            &self,
            _snapshot: &FileSystemLocationSnapshot,
        ) -> Result<Option<Fingerprint>, CacheError> {
            Ok(None)
        }
    }

    #[test]
    fn same_configuration_same_fingerprint() {
        assert_eq!(
            ConfigurationFingerprint::of(&Tagged("p1")),
            ConfigurationFingerprint::of(&Tagged("p1"))
        );
    }

    #[test]
    fn different_configuration_different_fingerprint() {
        assert_ne!(
            ConfigurationFingerprint::of(&Tagged("p1")),
            ConfigurationFingerprint::of(&Tagged("p2"))
        );
    }

    #[test]
    fn works_through_trait_objects() {
        let boxed: Box<dyn SnapshotHasher> = Box::new(Tagged("p1"));
        assert_eq!(
            ConfigurationFingerprint::of(boxed.as_ref()),
            ConfigurationFingerprint::of(&Tagged("p1"))
        );
    }

    #[test]
    fn display_is_hex() {
        let s = ConfigurationFingerprint::of(&Tagged("p1")).to_string();
        assert_eq!(s.len(), 32);
    }
}
