//! Ordered middleware groups and responder chain construction.

use std::sync::Arc;

use futures_util::future::BoxFuture;

use crate::error::Result;
use crate::http::{Request, Responder, Response};
use crate::middleware::root::RootResponder;
use crate::middleware::{IntoMiddleware, Middleware, Next, Wrap};

/// Append-only, ordered list of middleware.
#[derive(Debug, Clone, Default)]
pub struct MiddlewareGroup {
    middlewares: Vec<Middleware>,
}

impl MiddlewareGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add middleware after everything registered so far.
    pub fn add(&mut self, middleware: impl IntoMiddleware) -> &mut Self {
        let middleware = middleware.into_middleware();
        tracing::debug!(
            name = middleware.name(),
            position = self.middlewares.len(),
            "Middleware registered"
        );
        self.middlewares.push(middleware);
        self
    }

    pub fn len(&self) -> usize {
        self.middlewares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.middlewares.iter().map(Middleware::name).collect()
    }

    /// Compose the group around `terminal`.
    ///
    /// General middleware is folded from the last registered outward, so the
    /// first registered runs outermost. Pre-process middleware keeps
    /// registration order; post-process middleware runs in reverse.
    pub fn construct_responder(&self, terminal: impl Responder) -> RootResponder {
        let terminal: Arc<dyn Responder> = Arc::new(terminal);
        let first = self
            .middlewares
            .iter()
            .rev()
            .fold(terminal, |next, middleware| match middleware.general() {
                Some(general) => Arc::new(MiddlewareResponder {
                    middleware: Arc::clone(general),
                    next,
                }) as Arc<dyn Responder>,
                None => next,
            });

        let pre_process = self
            .middlewares
            .iter()
            .filter_map(|m| m.pre().cloned())
            .collect();
        let post_process = self
            .middlewares
            .iter()
            .rev()
            .filter_map(|m| m.post().cloned())
            .collect();

        RootResponder::new(pre_process, first, post_process)
    }
}

/// One link of the chain: a general middleware and what it delegates to.
struct MiddlewareResponder {
    middleware: Arc<dyn Wrap>,
    next: Arc<dyn Responder>,
}

impl Responder for MiddlewareResponder {
    fn respond(&self, request: Request) -> BoxFuture<'_, Result<Response>> {
        self.middleware
            .apply(request, Next::new(Arc::clone(&self.next)))
    }
}
