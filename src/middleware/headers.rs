//! Static response headers.
//!
//! # Responsibilities
//! - Add configured headers (e.g. `Server`) to every response
//! - Optionally add common security headers
//!
//! # Design Decisions
//! - Headers already set by the handler win; nothing is overwritten
//! - Invalid configured names or values are dropped at construction

use axum::http::{HeaderMap, HeaderName, HeaderValue};

use crate::http::{RequestHead, Response};
use crate::middleware::{IntoMiddleware, Middleware, PostProcess};

#[derive(Debug, Clone, Default)]
pub struct ResponseHeaders {
    headers: HeaderMap,
}

impl ResponseHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a header by name, skipping it if the name or value is invalid.
    pub fn with(mut self, name: &str, value: &str) -> Self {
        match (
            HeaderName::try_from(name),
            HeaderValue::try_from(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.headers.insert(name, value);
            }
            _ => tracing::warn!(header = name, "Ignoring invalid response header"),
        }
        self
    }

    /// `X-Content-Type-Options`, `X-Frame-Options` and `Referrer-Policy`.
    pub fn with_security_defaults(self) -> Self {
        self.with("x-content-type-options", "nosniff")
            .with("x-frame-options", "DENY")
            .with("referrer-policy", "no-referrer")
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }
}

impl PostProcess for ResponseHeaders {
    fn post_process(&self, _request: &RequestHead, response: &mut Response) {
        for (name, value) in &self.headers {
            if !response.headers().contains_key(name) {
                response.headers_mut().insert(name.clone(), value.clone());
            }
        }
    }
}

impl IntoMiddleware for ResponseHeaders {
    fn into_middleware(self) -> Middleware {
        Middleware::named("response_headers").with_post_process(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{Body, Request};
    use axum::http::{self, header, StatusCode};

    #[test]
    fn does_not_override_handler_headers() {
        let headers = ResponseHeaders::new()
            .with("server", "sluice")
            .with("bad header", "x")
            .with_security_defaults();
        assert_eq!(headers.len(), 4);

        let request: Request = http::Request::builder()
            .uri("/")
            .body(Body::empty())
            .unwrap()
            .into();
        let mut response = Response::new(StatusCode::OK)
            .with_header(header::SERVER, HeaderValue::from_static("custom"));
        headers.post_process(request.head(), &mut response);

        assert_eq!(response.headers()[header::SERVER], "custom");
        assert_eq!(response.headers()["x-frame-options"], "DENY");
    }
}
