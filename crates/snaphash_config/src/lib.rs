//! Parsing and validation of `snaphash.toml` hashing-policy files.
//!
//! This crate reads the policy file and produces a strongly-typed
//! [`HashingConfig`], then resolves it into a [`ResolvedPolicy`] with compiled
//! ignore patterns ready for the content hasher.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod resolve;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str, load_config_or_default, CONFIG_FILE};
pub use resolve::{resolve_policy, ResolvedPolicy};
pub use types::*;
