//! Middleware subsystem.
//!
//! # Data Flow
//! ```text
//! Request
//!     → root.rs: pre-process middleware, registration order (may short-circuit)
//!     → general middleware, registration order (before `next.run`)
//!     → terminal responder (route handler)
//!     → general middleware, reverse order (after `next.run`)
//!     → root.rs: post-process middleware, reverse registration order
//! Response
//! ```
//!
//! # Design Decisions
//! - A middleware is a record of optional capability slots fixed at
//!   registration, never probed per request
//! - `Next` is consumed by `run`, so a general middleware delegates at most once
//! - Groups are append-only; registration order is part of the contract

pub mod auth;
pub mod date;
pub mod group;
pub mod headers;
pub mod log;
pub mod metrics;
pub mod request_id;
pub mod root;

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;

use crate::error::Result;
use crate::http::{Request, RequestHead, Responder, Response};

pub use auth::BearerAuth;
pub use date::DateHeader;
pub use group::MiddlewareGroup;
pub use headers::ResponseHeaders;
pub use log::LogRequests;
pub use metrics::RequestMetrics;
pub use request_id::RequestIdHeader;
pub use root::RootResponder;

/// Short-circuit capability: answer a request before the chain runs.
pub trait PreProcess: Send + Sync + 'static {
    /// Return a response to stop processing, or `None` to continue.
    fn pre_process(&self, request: &Request) -> Option<Response>;
}

/// General capability: run code around the rest of the chain.
pub trait Wrap: Send + Sync + 'static {
    fn apply(&self, request: Request, next: Next) -> BoxFuture<'_, Result<Response>>;
}

/// Post-process capability: observe or amend a successful response.
pub trait PostProcess: Send + Sync + 'static {
    fn post_process(&self, request: &RequestHead, response: &mut Response);
}

/// The remainder of the chain, as seen by a general middleware.
///
/// Not `Clone`: `run` consumes it, so the chain is entered at most once.
/// Dropping it without running short-circuits the request.
pub struct Next {
    responder: Arc<dyn Responder>,
}

impl Next {
    pub(crate) fn new(responder: Arc<dyn Responder>) -> Self {
        Self { responder }
    }

    /// Delegate the request to the rest of the chain.
    pub fn run(self, request: Request) -> BoxFuture<'static, Result<Response>> {
        Box::pin(async move { self.responder.respond(request).await })
    }
}

/// A registered middleware: any subset of the three capabilities.
#[derive(Clone, Default)]
pub struct Middleware {
    name: &'static str,
    pre: Option<Arc<dyn PreProcess>>,
    general: Option<Arc<dyn Wrap>>,
    post: Option<Arc<dyn PostProcess>>,
}

impl Middleware {
    /// A middleware with no capabilities; add them with the `with_*` methods.
    pub fn named(name: &'static str) -> Self {
        Self {
            name,
            ..Self::default()
        }
    }

    pub fn with_pre_process(mut self, middleware: impl PreProcess) -> Self {
        self.pre = Some(Arc::new(middleware));
        self
    }

    pub fn with_wrap(mut self, middleware: impl Wrap) -> Self {
        self.general = Some(Arc::new(middleware));
        self
    }

    pub fn with_post_process(mut self, middleware: impl PostProcess) -> Self {
        self.post = Some(Arc::new(middleware));
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_pre_process(&self) -> bool {
        self.pre.is_some()
    }

    pub fn is_wrap(&self) -> bool {
        self.general.is_some()
    }

    pub fn is_post_process(&self) -> bool {
        self.post.is_some()
    }

    pub(crate) fn pre(&self) -> Option<&Arc<dyn PreProcess>> {
        self.pre.as_ref()
    }

    pub(crate) fn general(&self) -> Option<&Arc<dyn Wrap>> {
        self.general.as_ref()
    }

    pub(crate) fn post(&self) -> Option<&Arc<dyn PostProcess>> {
        self.post.as_ref()
    }
}

impl fmt::Debug for Middleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Middleware")
            .field("name", &self.name)
            .field("pre_process", &self.is_pre_process())
            .field("wrap", &self.is_wrap())
            .field("post_process", &self.is_post_process())
            .finish()
    }
}

/// Conversion into a registered [`Middleware`].
///
/// Built-in middleware types implement this to declare their capabilities.
pub trait IntoMiddleware {
    fn into_middleware(self) -> Middleware;
}

impl IntoMiddleware for Middleware {
    fn into_middleware(self) -> Middleware {
        self
    }
}

struct PreProcessFn<F>(F);

impl<F> PreProcess for PreProcessFn<F>
where
    F: Fn(&Request) -> Option<Response> + Send + Sync + 'static,
{
    fn pre_process(&self, request: &Request) -> Option<Response> {
        (self.0)(request)
    }
}

struct WrapFn<F>(F);

impl<F, Fut> Wrap for WrapFn<F>
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response>> + Send + 'static,
{
    fn apply(&self, request: Request, next: Next) -> BoxFuture<'_, Result<Response>> {
        Box::pin((self.0)(request, next))
    }
}

struct PostProcessFn<F>(F);

impl<F> PostProcess for PostProcessFn<F>
where
    F: Fn(&RequestHead, &mut Response) + Send + Sync + 'static,
{
    fn post_process(&self, request: &RequestHead, response: &mut Response) {
        (self.0)(request, response)
    }
}

/// Pre-process middleware from a closure.
pub fn pre_process_fn<F>(name: &'static str, f: F) -> Middleware
where
    F: Fn(&Request) -> Option<Response> + Send + Sync + 'static,
{
    Middleware::named(name).with_pre_process(PreProcessFn(f))
}

/// General middleware from a closure.
pub fn wrap_fn<F, Fut>(name: &'static str, f: F) -> Middleware
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response>> + Send + 'static,
{
    Middleware::named(name).with_wrap(WrapFn(f))
}

/// Post-process middleware from a closure.
pub fn post_process_fn<F>(name: &'static str, f: F) -> Middleware
where
    F: Fn(&RequestHead, &mut Response) + Send + Sync + 'static,
{
    Middleware::named(name).with_post_process(PostProcessFn(f))
}
