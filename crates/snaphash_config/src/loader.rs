//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::resolve::resolve_policy;
use crate::types::HashingConfig;
use std::path::Path;

/// Name of the configuration file looked up in a project directory.
pub const CONFIG_FILE: &str = "snaphash.toml";

/// Loads and validates a `snaphash.toml` configuration from a directory.
///
/// Reads `<dir>/snaphash.toml`, parses it, and validates it.
pub fn load_config(dir: &Path) -> Result<HashingConfig, ConfigError> {
    let config_path = dir.join(CONFIG_FILE);
    let content = std::fs::read_to_string(&config_path)?;
    load_config_from_str(&content)
}

/// Like [`load_config`], but returns the default configuration when the
/// directory has no `snaphash.toml`.
pub fn load_config_or_default(dir: &Path) -> Result<HashingConfig, ConfigError> {
    if dir.join(CONFIG_FILE).exists() {
        load_config(dir)
    } else {
        Ok(HashingConfig::default())
    }
}

/// Parses and validates a `snaphash.toml` configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<HashingConfig, ConfigError> {
    let config: HashingConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Validates that configuration values are usable.
fn validate_config(config: &HashingConfig) -> Result<(), ConfigError> {
    if config.cache.dir.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "cache.dir must not be empty".to_string(),
        ));
    }
    if config.normalization.ignore.iter().any(String::is_empty) {
        return Err(ConfigError::ValidationError(
            "normalization.ignore must not contain empty patterns".to_string(),
        ));
    }
    resolve_policy(config).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{LineEndings, DEFAULT_CACHE_DIR};

    #[test]
    fn parse_empty_config() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config.normalization.line_endings, LineEndings::Preserve);
        assert!(config.normalization.ignore.is_empty());
        assert_eq!(config.cache.dir, DEFAULT_CACHE_DIR);
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
[normalization]
line_endings = "normalize"
ignore = ["*.log", "*.tmp"]

[cache]
dir = "/tmp/snaphash"
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.normalization.line_endings, LineEndings::Normalize);
        assert_eq!(config.normalization.ignore, vec!["*.log", "*.tmp"]);
        assert_eq!(config.cache.dir, "/tmp/snaphash");
    }

    #[test]
    fn invalid_toml_errors() {
        let err = load_config_from_str("this is not toml [[[").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn unknown_line_ending_mode_errors() {
        let toml = r#"
[normalization]
line_endings = "crlf"
"#;
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn unknown_field_errors() {
        let toml = r#"
[normalization]
ignroe = ["*.log"]
"#;
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn invalid_glob_errors() {
        let toml = r#"
[normalization]
ignore = ["[unclosed"]
"#;
        let err = load_config_from_str(toml).unwrap_err();
        match err {
            ConfigError::InvalidPattern { pattern, .. } => assert_eq!(pattern, "[unclosed"),
            other => panic!("expected InvalidPattern, got {other:?}"),
        }
    }

    #[test]
    fn path_pattern_errors() {
        let toml = r#"
[normalization]
ignore = ["build/*.o"]
"#;
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn empty_pattern_errors() {
        let toml = r#"
[normalization]
ignore = [""]
"#;
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn empty_cache_dir_errors() {
        let toml = r#"
[cache]
dir = "  "
"#;
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "[normalization]\nline_endings = \"normalize\"\n",
        )
        .unwrap();
        let config = load_config(dir.path()).unwrap();
        assert_eq!(config.normalization.line_endings, LineEndings::Normalize);
    }

    #[test]
    fn io_error_from_nonexistent_dir() {
        let err = load_config(Path::new("/nonexistent/path/to/project")).unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }

    #[test]
    fn missing_file_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_or_default(dir.path()).unwrap();
        assert_eq!(config.cache.dir, DEFAULT_CACHE_DIR);
    }

    #[test]
    fn present_but_broken_file_is_not_defaulted() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "[[[").unwrap();
        assert!(load_config_or_default(dir.path()).is_err());
    }
}
