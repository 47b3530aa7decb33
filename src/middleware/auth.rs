//! Bearer token check for a protected path prefix.

use axum::http::{header, StatusCode};

use crate::http::{Request, Response};
use crate::middleware::{IntoMiddleware, Middleware, PreProcess};

/// Rejects requests under `path_prefix` that lack `Authorization: Bearer <key>`.
#[derive(Debug, Clone)]
pub struct BearerAuth {
    expected: String,
    path_prefix: String,
}

impl BearerAuth {
    pub fn new(api_key: impl AsRef<str>, path_prefix: impl Into<String>) -> Self {
        Self {
            expected: format!("Bearer {}", api_key.as_ref()),
            path_prefix: path_prefix.into(),
        }
    }
}

impl PreProcess for BearerAuth {
    fn pre_process(&self, request: &Request) -> Option<Response> {
        if !request.path().starts_with(&self.path_prefix) {
            return None;
        }
        if request.header(header::AUTHORIZATION) == Some(self.expected.as_str()) {
            return None;
        }
        tracing::warn!(parent: request.span(), path = %request.path(), "Unauthorized request");
        Some(
            Response::new(StatusCode::UNAUTHORIZED)
                .with_header(header::WWW_AUTHENTICATE, header::HeaderValue::from_static("Bearer"))
                .with_body("Unauthorized"),
        )
    }
}

impl IntoMiddleware for BearerAuth {
    fn into_middleware(self) -> Middleware {
        Middleware::named("bearer_auth").with_pre_process(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Body;
    use axum::http;

    fn request(path: &str, auth: Option<&str>) -> Request {
        let mut builder = http::Request::builder().uri(path);
        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        builder.body(Body::empty()).unwrap().into()
    }

    #[test]
    fn only_guards_prefix() {
        let auth = BearerAuth::new("s3cret", "/admin");
        assert!(auth.pre_process(&request("/public/file", None)).is_none());

        let denied = auth.pre_process(&request("/admin/stats", None)).unwrap();
        assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);

        let wrong = auth.pre_process(&request("/admin/stats", Some("Bearer nope")));
        assert!(wrong.is_some());

        assert!(auth
            .pre_process(&request("/admin/stats", Some("Bearer s3cret")))
            .is_none());
    }
}
