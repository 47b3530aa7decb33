//! `X-Request-ID` propagation.
//!
//! # Responsibilities
//! - Keep a client-supplied `x-request-id`, or generate a UUID v4
//! - Expose the value to downstream stages as a request extension
//! - Echo it on the response
//!
//! # Design Decisions
//! - Register first so every later stage sees the ID
//! - Only successful responses carry the header; failures leave the
//!   pipeline as errors and the transport builds their response

use axum::http::{HeaderName, HeaderValue};
use futures_util::future::BoxFuture;
use uuid::Uuid;

use crate::error::Result;
use crate::http::{Request, Response};
use crate::middleware::{IntoMiddleware, Middleware, Next, Wrap};

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Correlation ID attached to the request by [`RequestIdHeader`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelationId(pub String);

#[derive(Debug, Clone, Copy, Default)]
pub struct RequestIdHeader;

impl Wrap for RequestIdHeader {
    fn apply(&self, request: Request, next: Next) -> BoxFuture<'_, Result<Response>> {
        let value = request
            .headers()
            .get(&X_REQUEST_ID)
            .filter(|v| !v.is_empty())
            .cloned()
            .unwrap_or_else(generate);
        let correlation = CorrelationId(value.to_str().unwrap_or_default().to_string());
        let request = request
            .with_header(X_REQUEST_ID, value.clone())
            .with_extension(correlation);

        Box::pin(async move {
            let mut response = next.run(request).await?;
            response.headers_mut().insert(X_REQUEST_ID, value);
            Ok(response)
        })
    }
}

fn generate() -> HeaderValue {
    // A hyphenated UUID is always a valid header value.
    HeaderValue::from_str(&Uuid::new_v4().to_string())
        .unwrap_or_else(|_| HeaderValue::from_static("unknown"))
}

impl IntoMiddleware for RequestIdHeader {
    fn into_middleware(self) -> Middleware {
        Middleware::named("request_id").with_wrap(self)
    }
}
