//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// File I/O engine and static file settings.
    pub files: FilesConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Request size limits.
    pub limits: LimitsConfig,

    /// Built-in middleware selection.
    pub middleware: MiddlewareConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// File I/O configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FilesConfig {
    /// Directory served by the static file handler.
    pub root: PathBuf,

    /// Chunk size in bytes; files this size or larger are streamed.
    pub chunk_size: usize,

    /// Maximum blocking file operations in flight across all requests.
    pub max_blocking_ops: usize,

    /// Accept PUT uploads into `root`.
    pub allow_uploads: bool,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("public"),
            chunk_size: 128 * 1024,
            max_blocking_ops: 64,
            allow_uploads: false,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Request limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum request body size in bytes.
    pub max_body_size: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_size: 64 * 1024 * 1024, // 64MB
        }
    }
}

/// Which built-in middleware to register.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MiddlewareConfig {
    /// Propagate or generate `x-request-id`.
    pub request_id: bool,

    /// Log every request at `log_level`.
    pub log_requests: bool,

    /// Level for request logs (trace, debug, info, warn, error).
    pub log_level: String,

    /// Record request metrics.
    pub metrics: bool,

    /// Add a `Date` header to responses.
    pub date_header: bool,

    /// `Server` header value; omitted when empty.
    pub server_name: String,

    /// Add common security response headers.
    pub security_headers: bool,

    /// Bearer token protection.
    pub auth: AuthConfig,
}

impl Default for MiddlewareConfig {
    fn default() -> Self {
        Self {
            request_id: true,
            log_requests: true,
            log_level: "info".to_string(),
            metrics: true,
            date_header: true,
            server_name: "sluice".to_string(),
            security_headers: false,
            auth: AuthConfig::default(),
        }
    }
}

/// Bearer token protection for a path prefix.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    pub enabled: bool,

    /// Token expected in `Authorization: Bearer <api_key>`.
    pub api_key: String,

    /// Requests whose path starts with this prefix are protected.
    pub path_prefix: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: String::new(),
            path_prefix: "/".to_string(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
