//! Fingerprints and the streaming accumulator used to build them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use xxhash_rust::xxh3::Xxh3;

/// A 128-bit fingerprint computed using XXH3.
///
/// Two inputs with the same `Fingerprint` are assumed to be identical. Used
/// both for file content and for summarizing hashing configuration, and as
/// the building block of cache keys.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Fingerprint([u8; 16]);

impl Fingerprint {
    /// Computes a fingerprint from a byte slice using XXH3-128.
    pub fn from_bytes(data: &[u8]) -> Self {
        let hash = xxhash_rust::xxh3::xxh3_128(data);
        Self(hash.to_le_bytes())
    }

    /// Wraps raw digest bytes.
    pub fn from_raw(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Returns the raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Derives a fixed fingerprint from a name.
    ///
    /// Used for sentinel values and implementation tags that must stay
    /// stable across processes.
    pub fn signature(name: &str) -> Self {
        let mut hasher = Hasher::new();
        hasher.put_str("signature");
        hasher.put_str(name);
        hasher.finish()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({:02x}{:02x}..)", self.0[0], self.0[1])
    }
}

/// Error returned when parsing a [`Fingerprint`] from its hex form fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid fingerprint '{input}': expected 32 hex characters")]
pub struct ParseFingerprintError {
    /// The rejected input.
    pub input: String,
}

impl FromStr for Fingerprint {
    type Err = ParseFingerprintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseFingerprintError {
            input: s.to_string(),
        };
        if s.len() != 32 || !s.is_ascii() {
            return Err(err());
        }
        let mut bytes = [0u8; 16];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16).map_err(|_| err())?;
        }
        Ok(Self(bytes))
    }
}

/// Streaming accumulator that produces a [`Fingerprint`].
///
/// Variable-length values are length-prefixed so that adjacent values can
/// never run together (`"ab", "c"` and `"a", "bc"` hash differently).
pub struct Hasher {
    state: Xxh3,
}

impl Hasher {
    /// Creates an empty accumulator.
    pub fn new() -> Self {
        Self { state: Xxh3::new() }
    }

    /// Appends raw bytes without a length prefix.
    pub fn put_bytes(&mut self, bytes: &[u8]) {
        self.state.update(bytes);
    }

    /// Appends a length-prefixed string.
    pub fn put_str(&mut self, s: &str) {
        self.put_len(s.len());
        self.state.update(s.as_bytes());
    }

    /// Appends a length or count as a little-endian `u64`.
    pub fn put_len(&mut self, len: usize) {
        self.put_u64(len as u64);
    }

    /// Appends a little-endian `u64`.
    pub fn put_u64(&mut self, value: u64) {
        self.state.update(&value.to_le_bytes());
    }

    /// Appends a boolean as a single byte.
    pub fn put_bool(&mut self, value: bool) {
        self.state.update(&[u8::from(value)]);
    }

    /// Appends another fingerprint.
    pub fn put_fingerprint(&mut self, fingerprint: &Fingerprint) {
        self.state.update(&fingerprint.0);
    }

    /// Finalizes the accumulated input into a fingerprint.
    pub fn finish(&self) -> Fingerprint {
        Fingerprint(self.state.digest128().to_le_bytes())
    }
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic() {
        let a = Fingerprint::from_bytes(b"hello world");
        let b = Fingerprint::from_bytes(b"hello world");
        assert_eq!(a, b);
    }

    #[test]
    fn different_inputs_differ() {
        let a = Fingerprint::from_bytes(b"hello");
        let b = Fingerprint::from_bytes(b"world");
        assert_ne!(a, b);
    }

    #[test]
    fn display_format() {
        let h = Fingerprint::from_bytes(b"test");
        let s = format!("{h}");
        assert_eq!(s.len(), 32, "Display should be 32 hex chars");
        assert!(s.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn parse_display_output() {
        let h = Fingerprint::from_bytes(b"parse me");
        let parsed: Fingerprint = h.to_string().parse().unwrap();
        assert_eq!(parsed, h);
    }

    #[test]
    fn parse_rejects_bad_input() {
        assert!("abc".parse::<Fingerprint>().is_err());
        assert!("zz".repeat(16).parse::<Fingerprint>().is_err());
        let err = "xyz".parse::<Fingerprint>().unwrap_err();
        assert!(err.to_string().contains("xyz"));
    }

    #[test]
    fn debug_abbreviated() {
        let h = Fingerprint::from_bytes(b"test");
        let s = format!("{h:?}");
        assert!(s.starts_with("Fingerprint("));
        assert!(s.ends_with(")"));
    }

    #[test]
    fn serde_roundtrip() {
        let h = Fingerprint::from_bytes(b"serde test");
        let json = serde_json::to_string(&h).unwrap();
        let back: Fingerprint = serde_json::from_str(&json).unwrap();
        assert_eq!(h, back);
    }

    #[test]
    fn streaming_matches_one_shot() {
        let mut hasher = Hasher::new();
        hasher.put_bytes(b"hello ");
        hasher.put_bytes(b"world");
        assert_eq!(hasher.finish(), Fingerprint::from_bytes(b"hello world"));
    }

    #[test]
    fn strings_are_length_prefixed() {
        let mut a = Hasher::new();
        a.put_str("ab");
        a.put_str("c");
        let mut b = Hasher::new();
        b.put_str("a");
        b.put_str("bc");
        assert_ne!(a.finish(), b.finish());
    }

    #[test]
    fn lengths_use_full_width_prefix() {
        let mut a = Hasher::new();
        a.put_len(1 << 32);
        let mut b = Hasher::new();
        b.put_len(0);
        assert_ne!(a.finish(), b.finish());

        let mut prefixed = Hasher::new();
        prefixed.put_str("ab");
        let mut manual = Hasher::new();
        manual.put_u64(2);
        manual.put_bytes(b"ab");
        assert_eq!(prefixed.finish(), manual.finish());
    }

    #[test]
    fn bool_changes_digest() {
        let mut a = Hasher::new();
        a.put_bool(true);
        let mut b = Hasher::new();
        b.put_bool(false);
        assert_ne!(a.finish(), b.finish());
    }

    #[test]
    fn signature_is_stable_and_distinct() {
        assert_eq!(Fingerprint::signature("x"), Fingerprint::signature("x"));
        assert_ne!(Fingerprint::signature("x"), Fingerprint::signature("y"));
    }
}
