//! Error types for configuration loading and validation.

/// Errors that can occur when loading or validating a `snaphash.toml` configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An I/O error occurred while reading the configuration file.
    #[error("failed to read configuration: {0}")]
    IoError(#[from] std::io::Error),

    /// The TOML content could not be parsed.
    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    /// An ignore pattern is not a valid glob.
    #[error("invalid ignore pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// The offending pattern as written.
        pattern: String,
        /// Why the glob compiler rejected it.
        reason: String,
    },

    /// A configuration value failed validation.
    #[error("validation error: {0}")]
    ValidationError(String),
}
