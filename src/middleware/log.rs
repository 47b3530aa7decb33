//! Per-request logging.

use std::time::Instant;

use futures_util::future::BoxFuture;
use tracing::Level;

use crate::error::Result;
use crate::http::{Request, Response};
use crate::middleware::{IntoMiddleware, Middleware, Next, Wrap};

/// Logs each request and its outcome at a fixed level.
#[derive(Debug, Clone, Copy)]
pub struct LogRequests {
    level: Level,
}

impl LogRequests {
    pub fn new(level: Level) -> Self {
        Self { level }
    }
}

impl Default for LogRequests {
    fn default() -> Self {
        Self::new(Level::INFO)
    }
}

macro_rules! event_at {
    ($level:expr, $($arg:tt)+) => {
        match $level {
            Level::TRACE => tracing::trace!($($arg)+),
            Level::DEBUG => tracing::debug!($($arg)+),
            Level::INFO => tracing::info!($($arg)+),
            Level::WARN => tracing::warn!($($arg)+),
            _ => tracing::error!($($arg)+),
        }
    };
}

impl Wrap for LogRequests {
    fn apply(&self, request: Request, next: Next) -> BoxFuture<'_, Result<Response>> {
        let level = self.level;
        let span = request.span().clone();
        let method = request.method().clone();
        let uri = request.uri().clone();
        Box::pin(async move {
            event_at!(level, parent: &span, method = %method, uri = %uri, "Request received");
            let started = Instant::now();
            let result = next.run(request).await;
            let elapsed_ms = started.elapsed().as_millis() as u64;
            match &result {
                Ok(response) => event_at!(
                    level,
                    parent: &span,
                    status = %response.status(),
                    elapsed_ms,
                    "Request completed"
                ),
                Err(err) => tracing::warn!(
                    parent: &span,
                    error = %err,
                    elapsed_ms,
                    "Request failed"
                ),
            }
            result
        })
    }
}

impl IntoMiddleware for LogRequests {
    fn into_middleware(self) -> Middleware {
        Middleware::named("log_requests").with_wrap(self)
    }
}
