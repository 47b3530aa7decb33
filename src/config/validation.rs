//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (chunk size > 0, timeouts > 0)
//! - Check addresses parse and log levels are known
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::AppConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address `{value}`")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("{field}: unknown log level `{value}`")]
    UnknownLogLevel { field: &'static str, value: String },

    #[error("middleware.auth.api_key must be set when auth is enabled")]
    MissingApiKey,
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    let positive = [
        ("files.chunk_size", config.files.chunk_size as u64),
        ("files.max_blocking_ops", config.files.max_blocking_ops as u64),
        ("timeouts.request_secs", config.timeouts.request_secs),
        ("limits.max_body_size", config.limits.max_body_size as u64),
    ];
    for (field, value) in positive {
        if value == 0 {
            errors.push(ValidationError::Zero { field });
        }
    }

    let levels = [
        ("observability.log_level", &config.observability.log_level),
        ("middleware.log_level", &config.middleware.log_level),
    ];
    for (field, value) in levels {
        if !LOG_LEVELS.contains(&value.to_ascii_lowercase().as_str()) {
            errors.push(ValidationError::UnknownLogLevel {
                field,
                value: value.clone(),
            });
        }
    }

    if config.middleware.auth.enabled && config.middleware.auth.api_key.is_empty() {
        errors.push(ValidationError::MissingApiKey);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
