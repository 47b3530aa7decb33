//! Sluice: a composable middleware pipeline and streaming file I/O engine
//! for HTTP servers.

pub mod application;
pub mod config;
pub mod error;
pub mod files;
pub mod http;
pub mod lifecycle;
pub mod middleware;
pub mod observability;

pub use application::Application;
pub use config::AppConfig;
pub use error::{Error, HttpError, Result};
pub use files::{FileIO, FileServer};
pub use http::{handler, Body, HttpServer, Request, Responder, Response};
pub use lifecycle::Shutdown;
pub use middleware::{Middleware, MiddlewareGroup};
