//! The responder abstraction: turn one request into one response.

use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;

use crate::error::Result;
use crate::http::request::Request;
use crate::http::response::{ResponsePatch, ToResponse};
use crate::http::Response;

/// Produces a response for a request, asynchronously and possibly failing.
///
/// The request is taken by value, so each invocation consumes exactly one
/// request.
pub trait Responder: Send + Sync + 'static {
    fn respond(&self, request: Request) -> BoxFuture<'_, Result<Response>>;
}

impl<R: Responder + ?Sized> Responder for Arc<R> {
    fn respond(&self, request: Request) -> BoxFuture<'_, Result<Response>> {
        (**self).respond(request)
    }
}

impl<R: Responder + ?Sized> Responder for Box<R> {
    fn respond(&self, request: Request) -> BoxFuture<'_, Result<Response>> {
        (**self).respond(request)
    }
}

/// Responder backed by an async handler function.
#[derive(Clone)]
pub struct HandlerResponder<F> {
    handler: F,
}

/// Adapt a handler into a [`Responder`].
///
/// The handler may return anything implementing [`ToResponse`]. A
/// [`ResponsePatch`] attached to the request by upstream middleware is
/// merged into the handler's response.
pub fn handler<F, Fut, T>(handler: F) -> HandlerResponder<F>
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = T> + Send + 'static,
    T: ToResponse,
{
    HandlerResponder { handler }
}

impl<F, Fut, T> Responder for HandlerResponder<F>
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = T> + Send + 'static,
    T: ToResponse,
{
    fn respond(&self, request: Request) -> BoxFuture<'_, Result<Response>> {
        let patch = request.extension::<ResponsePatch>().cloned();
        let output = (self.handler)(request);
        Box::pin(async move {
            let mut response = output.await.to_response()?;
            if let Some(patch) = patch {
                response.apply_patch(patch);
            }
            Ok(response)
        })
    }
}
