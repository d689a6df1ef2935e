//! Shared foundational types used across the snaphash crates.
//!
//! This crate provides the [`Fingerprint`] digest type and the streaming
//! [`Hasher`] accumulator used for both content and configuration hashing.

#![warn(missing_docs)]

pub mod hash;

pub use hash::{Fingerprint, Hasher, ParseFingerprintError};
