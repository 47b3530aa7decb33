//! Application assembly.
//!
//! Registers the configured middleware in a fixed order and wraps the
//! resulting responder chain in an [`HttpServer`].

use std::str::FromStr;

use tracing::Level;

use crate::config::AppConfig;
use crate::files::{FileIO, FileServer};
use crate::http::{HttpServer, Responder};
use crate::middleware::{
    BearerAuth, DateHeader, LogRequests, MiddlewareGroup, RequestIdHeader, RequestMetrics,
    ResponseHeaders, RootResponder,
};

/// A configured middleware group plus the shared file engine.
pub struct Application {
    config: AppConfig,
    middleware: MiddlewareGroup,
    files: FileIO,
}

impl Application {
    /// Build the application from configuration.
    ///
    /// Middleware registration order, outermost first: request ID, request
    /// logging, metrics, bearer auth, response headers, date header.
    pub fn new(config: AppConfig) -> Self {
        let mut middleware = MiddlewareGroup::new();
        let settings = &config.middleware;

        if settings.request_id {
            middleware.add(RequestIdHeader);
        }
        if settings.log_requests {
            let level = Level::from_str(&settings.log_level).unwrap_or(Level::INFO);
            middleware.add(LogRequests::new(level));
        }
        if settings.metrics {
            middleware.add(RequestMetrics);
        }
        if settings.auth.enabled {
            middleware.add(BearerAuth::new(
                &settings.auth.api_key,
                settings.auth.path_prefix.clone(),
            ));
        }

        let mut headers = ResponseHeaders::new();
        if !settings.server_name.is_empty() {
            headers = headers.with("server", &settings.server_name);
        }
        if settings.security_headers {
            headers = headers.with_security_defaults();
        }
        if !headers.is_empty() {
            middleware.add(headers);
        }

        if settings.date_header {
            middleware.add(DateHeader::new());
        }

        let files = FileIO::from_config(&config.files);
        tracing::debug!(middleware = ?middleware.names(), "Application assembled");

        Self {
            config,
            middleware,
            files,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Register additional middleware inside the configured ones.
    pub fn middleware_mut(&mut self) -> &mut MiddlewareGroup {
        &mut self.middleware
    }

    pub fn files(&self) -> &FileIO {
        &self.files
    }

    /// A file server over the configured root, sharing this application's
    /// blocking pool.
    pub fn file_server(&self) -> FileServer {
        FileServer::new(self.config.files.root.clone(), self.files.clone())
            .allow_uploads(self.config.files.allow_uploads)
    }

    pub fn construct_responder(&self, terminal: impl Responder) -> RootResponder {
        self.middleware.construct_responder(terminal)
    }

    pub fn into_server(self, terminal: impl Responder) -> HttpServer {
        let responder = self.construct_responder(terminal);
        HttpServer::new(&self.config, responder)
    }
}
