//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::AppConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    let config: AppConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config = parse_config(&content)?;
    tracing::debug!(path = %path.display(), "Configuration loaded");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.files.chunk_size, 128 * 1024);
    }

    #[test]
    fn partial_sections_merge_with_defaults() {
        let config = parse_config(
            r#"
            [files]
            root = "/srv/www"
            chunk_size = 4096

            [middleware.auth]
            enabled = true
            api_key = "k"
            path_prefix = "/private"
            "#,
        )
        .unwrap();
        assert_eq!(config.files.root.to_str(), Some("/srv/www"));
        assert_eq!(config.files.chunk_size, 4096);
        assert_eq!(config.files.max_blocking_ops, 64);
        assert!(config.middleware.auth.enabled);
        assert!(config.middleware.date_header);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = parse_config("[files]\nchunk_size = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref errors) if errors.len() == 1));
        assert!(err.to_string().contains("chunk_size"));

        assert!(matches!(
            parse_config("[listener]\nbind_address = 7\n"),
            Err(ConfigError::Parse(_))
        ));
    }
}
