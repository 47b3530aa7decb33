//! Request value type.
//!
//! # Responsibilities
//! - Carry method, URI, headers, body and typed extensions through the pipeline
//! - Assign a process-wide request ID and a tracing span per request
//! - Let stages attach typed values (extensions) for downstream consumption
//!
//! # Design Decisions
//! - Immutable by convention: `with_*` methods consume and return a new request
//! - The head is cheaply cloneable so post-processing can observe it after the
//!   body has been handed to the chain
//! - A stream body is collected at most once, then replaced by a buffer

use std::any::type_name;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::http::{
    self, request::Parts, Extensions, HeaderMap, HeaderName, HeaderValue, Method, Uri, Version,
};
use tracing::Span;

use crate::error::{Error, Result};
use crate::http::body::Body;

/// Global counter for request IDs.
/// Relaxed ordering is enough: only uniqueness matters.
static REQUEST_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique, monotonically increasing identifier of a request in this process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(u64);

impl RequestId {
    /// Allocate the next request ID.
    pub fn next() -> Self {
        Self(REQUEST_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Connection-level facts the transport knows about a request.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    remote_addr: Option<SocketAddr>,
}

impl RequestContext {
    pub fn new(remote_addr: Option<SocketAddr>) -> Self {
        Self { remote_addr }
    }

    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }
}

/// Everything about a request except its body.
#[derive(Debug, Clone)]
pub struct RequestHead {
    pub id: RequestId,
    pub method: Method,
    pub uri: Uri,
    pub version: Version,
    pub headers: HeaderMap,
    pub extensions: Extensions,
    pub context: RequestContext,
    span: Span,
}

impl RequestHead {
    fn from_parts(parts: Parts, context: RequestContext) -> Self {
        let id = RequestId::next();
        let span = tracing::info_span!(
            "request",
            request_id = %id,
            method = %parts.method,
            path = %parts.uri.path(),
        );
        Self {
            id,
            method: parts.method,
            uri: parts.uri,
            version: parts.version,
            headers: parts.headers,
            extensions: parts.extensions,
            context,
            span,
        }
    }

    /// Span tagged with this request's ID; the request's logger.
    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn path(&self) -> &str {
        self.uri.path()
    }

    pub fn header(&self, name: impl http::header::AsHeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// A request flowing through the pipeline.
#[derive(Debug)]
pub struct Request {
    head: RequestHead,
    body: Body,
}

impl Request {
    /// Build a request from HTTP parts, a body and transport context.
    pub fn from_parts(parts: Parts, body: Body, context: RequestContext) -> Self {
        Self {
            head: RequestHead::from_parts(parts, context),
            body,
        }
    }

    pub fn into_parts(self) -> (RequestHead, Body) {
        (self.head, self.body)
    }

    pub fn head(&self) -> &RequestHead {
        &self.head
    }

    pub fn id(&self) -> RequestId {
        self.head.id
    }

    pub fn method(&self) -> &Method {
        &self.head.method
    }

    pub fn uri(&self) -> &Uri {
        &self.head.uri
    }

    pub fn path(&self) -> &str {
        self.head.path()
    }

    pub fn version(&self) -> Version {
        self.head.version
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.head.headers
    }

    pub fn header(&self, name: impl http::header::AsHeaderName) -> Option<&str> {
        self.head.header(name)
    }

    pub fn context(&self) -> &RequestContext {
        &self.head.context
    }

    pub fn span(&self) -> &Span {
        self.head.span()
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn into_body(self) -> Body {
        self.body
    }

    pub fn extension<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.head.extensions.get::<T>()
    }

    /// Like [`Request::extension`], but a missing value is an error.
    pub fn require_extension<T: Send + Sync + 'static>(&self) -> Result<&T> {
        self.extension::<T>()
            .ok_or(Error::MissingExtension(type_name::<T>()))
    }

    pub fn with_body(self, body: impl Into<Body>) -> Self {
        Self {
            head: self.head,
            body: body.into(),
        }
    }

    pub fn with_extension<T: Clone + Send + Sync + 'static>(mut self, value: T) -> Self {
        self.head.extensions.insert(value);
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.head.headers.insert(name, value);
        self
    }

    /// Replace a stream body with the buffered bytes it produces.
    pub async fn collate(self) -> Result<Self> {
        match self.body {
            Body::Buffer(_) => Ok(self),
            Body::Stream(stream) => {
                let bytes = stream.collect().await?;
                Ok(Self {
                    head: self.head,
                    body: Body::Buffer(bytes),
                })
            }
        }
    }
}

impl From<http::Request<Body>> for Request {
    fn from(request: http::Request<Body>) -> Self {
        let (parts, body) = request.into_parts();
        Request::from_parts(parts, body, RequestContext::default())
    }
}
