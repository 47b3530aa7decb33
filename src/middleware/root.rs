//! Entry point of a composed middleware chain.

use std::sync::Arc;

use futures_util::future::BoxFuture;

use crate::error::Result;
use crate::http::{Request, Responder, Response};
use crate::middleware::{PostProcess, PreProcess};

/// The fully composed pipeline: pre-process, general chain, post-process.
pub struct RootResponder {
    pre_process: Vec<Arc<dyn PreProcess>>,
    first: Arc<dyn Responder>,
    /// Already in reverse registration order.
    post_process: Vec<Arc<dyn PostProcess>>,
}

impl RootResponder {
    pub(crate) fn new(
        pre_process: Vec<Arc<dyn PreProcess>>,
        first: Arc<dyn Responder>,
        post_process: Vec<Arc<dyn PostProcess>>,
    ) -> Self {
        Self {
            pre_process,
            first,
            post_process,
        }
    }
}

impl Responder for RootResponder {
    fn respond(&self, request: Request) -> BoxFuture<'_, Result<Response>> {
        for middleware in &self.pre_process {
            if let Some(response) = middleware.pre_process(&request) {
                tracing::debug!(
                    parent: request.span(),
                    status = %response.status(),
                    "Request short-circuited"
                );
                return Box::pin(async move { Ok(response) });
            }
        }

        if self.post_process.is_empty() {
            return self.first.respond(request);
        }

        let head = request.head().clone();
        Box::pin(async move {
            let mut response = self.first.respond(request).await?;
            for middleware in &self.post_process {
                middleware.post_process(&head, &mut response);
            }
            Ok(response)
        })
    }
}
