//! Response value type.
//!
//! # Responsibilities
//! - Carry status, headers and body back out of the pipeline
//! - Merge late additions (`ResponsePatch`) into a built response
//! - Convert handler return values into responses (`ToResponse`)
//!
//! # Design Decisions
//! - Mutation goes through explicit methods; post-processing may add headers
//!   but never swaps the response object
//! - Patch headers replace every existing value of the same name

use axum::http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode};
use bytes::Bytes;

use crate::error::{Error, HttpError, Result};
use crate::http::body::Body;

/// A response produced by the pipeline.
#[derive(Debug)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Body,
}

impl Response {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Body::empty(),
        }
    }

    pub fn ok(body: impl Into<Body>) -> Self {
        Self::new(StatusCode::OK).with_body(body)
    }

    pub fn with_body(mut self, body: impl Into<Body>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn into_body(self) -> Body {
        self.body
    }

    pub fn into_parts(self) -> (StatusCode, HeaderMap, Body) {
        (self.status, self.headers, self.body)
    }

    /// Reconcile this response with a patch built elsewhere.
    pub fn apply_patch(&mut self, patch: ResponsePatch) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        let mut last_name = None;
        for (name, value) in patch.headers {
            // HeaderMap iteration yields the name only on its first value.
            let name = match name {
                Some(name) => {
                    self.headers.remove(&name);
                    last_name = Some(name.clone());
                    name
                }
                None => match &last_name {
                    Some(name) => name.clone(),
                    None => continue,
                },
            };
            self.headers.append(name, value);
        }
    }
}

/// Status and headers to merge into whatever response a handler produces.
///
/// Middleware attaches one as a request extension; the handler adapter
/// applies it to the handler's response.
#[derive(Debug, Clone, Default)]
pub struct ResponsePatch {
    pub status: Option<StatusCode>,
    pub headers: HeaderMap,
}

impl ResponsePatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }
}

/// Values a handler may return.
pub trait ToResponse {
    fn to_response(self) -> Result<Response>;
}

impl ToResponse for Response {
    fn to_response(self) -> Result<Response> {
        Ok(self)
    }
}

impl ToResponse for StatusCode {
    fn to_response(self) -> Result<Response> {
        Ok(Response::new(self))
    }
}

fn text(body: impl Into<Body>) -> Response {
    Response::ok(body).with_header(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    )
}

impl ToResponse for &'static str {
    fn to_response(self) -> Result<Response> {
        Ok(text(self))
    }
}

impl ToResponse for String {
    fn to_response(self) -> Result<Response> {
        Ok(text(self))
    }
}

impl ToResponse for Bytes {
    fn to_response(self) -> Result<Response> {
        Ok(Response::ok(self))
    }
}

impl ToResponse for Vec<u8> {
    fn to_response(self) -> Result<Response> {
        Ok(Response::ok(self))
    }
}

impl ToResponse for Body {
    fn to_response(self) -> Result<Response> {
        Ok(Response::ok(self))
    }
}

impl ToResponse for serde_json::Value {
    fn to_response(self) -> Result<Response> {
        let body = serde_json::to_vec(&self).map_err(Error::other)?;
        Ok(Response::ok(body).with_header(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        ))
    }
}

impl ToResponse for HttpError {
    fn to_response(self) -> Result<Response> {
        Err(Error::Http(self))
    }
}

impl<T: ToResponse> ToResponse for (StatusCode, T) {
    fn to_response(self) -> Result<Response> {
        let mut response = self.1.to_response()?;
        response.set_status(self.0);
        Ok(response)
    }
}

impl<T, E> ToResponse for std::result::Result<T, E>
where
    T: ToResponse,
    E: Into<Error>,
{
    fn to_response(self) -> Result<Response> {
        match self {
            Ok(value) => value.to_response(),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_replaces_headers_and_status() {
        let mut response = Response::ok("body")
            .with_header(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"))
            .with_header(header::ETAG, HeaderValue::from_static("\"v1\""));

        let patch = ResponsePatch::new()
            .status(StatusCode::CREATED)
            .header(header::SET_COOKIE, HeaderValue::from_static("a=1"))
            .header(header::SET_COOKIE, HeaderValue::from_static("b=2"))
            .header(header::CACHE_CONTROL, HeaderValue::from_static("max-age=60"));
        response.apply_patch(patch);

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[header::CACHE_CONTROL], "max-age=60");
        assert_eq!(response.headers().get_all(header::SET_COOKIE).iter().count(), 2);
        assert_eq!(response.headers()[header::ETAG], "\"v1\"");
    }

    #[test]
    fn tuple_overrides_status() {
        let response = (StatusCode::ACCEPTED, "queued").to_response().unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/plain; charset=utf-8");
    }

    #[test]
    fn errors_pass_through() {
        let result: std::result::Result<&'static str, HttpError> = Err(HttpError::not_found());
        let err = result.to_response().unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn json_sets_content_type() {
        let response = serde_json::json!({ "ok": true }).to_response().unwrap();
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
        assert_eq!(
            response.body().as_bytes().map(|b| b.as_ref()),
            Some(&b"{\"ok\":true}"[..])
        );
    }
}
