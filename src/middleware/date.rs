//! `Date` response header.

use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::http::{header, HeaderValue};

use crate::http::{RequestHead, Response};
use crate::middleware::{IntoMiddleware, Middleware, PostProcess};

/// Sets the `Date` header on every response, replacing any existing value.
///
/// The formatted value is cached and rebuilt at most once per second.
#[derive(Debug, Default)]
pub struct DateHeader {
    cache: Mutex<Option<(u64, HeaderValue)>>,
}

impl DateHeader {
    pub fn new() -> Self {
        Self::default()
    }

    fn current(&self) -> Option<HeaderValue> {
        let now = SystemTime::now();
        let second = now
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();

        let mut cache = self.cache.lock().ok()?;
        if let Some((cached_at, value)) = cache.as_ref() {
            if *cached_at == second {
                return Some(value.clone());
            }
        }
        let value = HeaderValue::from_str(&httpdate::fmt_http_date(now)).ok()?;
        *cache = Some((second, value.clone()));
        Some(value)
    }
}

impl PostProcess for DateHeader {
    fn post_process(&self, _request: &RequestHead, response: &mut Response) {
        if let Some(value) = self.current() {
            response.headers_mut().insert(header::DATE, value);
        }
    }
}

impl IntoMiddleware for DateHeader {
    fn into_middleware(self) -> Middleware {
        Middleware::named("date_header").with_post_process(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{Body, Request};
    use axum::http::{self, StatusCode};

    #[test]
    fn replaces_existing_date() {
        let request: Request = http::Request::builder()
            .uri("/")
            .body(Body::empty())
            .unwrap()
            .into();
        let mut response = Response::new(StatusCode::OK)
            .with_header(header::DATE, HeaderValue::from_static("yesterday"));

        DateHeader::new().post_process(request.head(), &mut response);

        let date = response.headers()[header::DATE].to_str().unwrap();
        assert!(httpdate::parse_http_date(date).is_ok());
        assert_eq!(response.headers().get_all(header::DATE).iter().count(), 1);
    }
}
