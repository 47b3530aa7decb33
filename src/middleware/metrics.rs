//! Request counters and latency histograms.

use std::time::Instant;

use futures_util::future::BoxFuture;

use crate::error::Result;
use crate::http::{Request, Response};
use crate::middleware::{IntoMiddleware, Middleware, Next, Wrap};
use crate::observability::metrics;

/// Records `sluice_requests_total` and `sluice_request_duration_seconds`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestMetrics;

impl Wrap for RequestMetrics {
    fn apply(&self, request: Request, next: Next) -> BoxFuture<'_, Result<Response>> {
        let method = request.method().to_string();
        Box::pin(async move {
            let started = Instant::now();
            let result = next.run(request).await;
            let status = match &result {
                Ok(response) => response.status().as_u16(),
                Err(err) => err.status().as_u16(),
            };
            metrics::record_request(&method, status, started);
            result
        })
    }
}

impl IntoMiddleware for RequestMetrics {
    fn into_middleware(self) -> Middleware {
        Middleware::named("request_metrics").with_wrap(self)
    }
}
