//! HTTP server setup and the pipeline adapter.
//!
//! # Responsibilities
//! - Create the Axum router with the pipeline as its fallback service
//! - Wire up tower layers (tracing, timeouts, body limits)
//! - Convert Axum requests into pipeline requests and back
//! - Map pipeline errors onto status responses
//! - Bind to a listener and shut down gracefully

use std::convert::Infallible;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use axum::{
    body::{Body as AxumBody, HttpBody},
    extract::ConnectInfo,
    http::{header, HeaderValue, StatusCode},
    response::Response as AxumResponse,
    Router,
};
use futures_util::{future::BoxFuture, TryStreamExt};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::Service;
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::Instrument;

use crate::config::AppConfig;
use crate::error::Error;
use crate::http::body::{Body, BodyStream};
use crate::http::request::{Request, RequestContext};
use crate::http::responder::Responder;
use crate::http::response::Response;

/// Tower service that hands every request to a pipeline responder.
#[derive(Clone)]
pub struct PipelineService {
    responder: Arc<dyn Responder>,
}

impl PipelineService {
    pub fn from_shared(responder: Arc<dyn Responder>) -> Self {
        Self { responder }
    }
}

impl Service<axum::extract::Request> for PipelineService {
    type Response = AxumResponse;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<AxumResponse, Infallible>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: axum::extract::Request) -> Self::Future {
        let responder = Arc::clone(&self.responder);
        let request = into_pipeline_request(request);
        let span = request.span().clone();

        Box::pin(
            async move {
                let response = match responder.respond(request).await {
                    Ok(response) => into_axum_response(response),
                    Err(err) => error_response(&err),
                };
                Ok(response)
            }
            .instrument(span),
        )
    }
}

fn into_pipeline_request(request: axum::extract::Request) -> Request {
    let (parts, body) = request.into_parts();
    let remote_addr = parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);

    let body = if body.size_hint().exact() == Some(0) {
        Body::empty()
    } else {
        Body::Stream(BodyStream::from_stream(
            body.into_data_stream().map_err(io::Error::other),
        ))
    };

    Request::from_parts(parts, body, RequestContext::new(remote_addr))
}

fn into_axum_response(response: Response) -> AxumResponse {
    let (status, headers, body) = response.into_parts();
    let body = match body {
        Body::Buffer(bytes) => AxumBody::from(bytes),
        Body::Stream(stream) => AxumBody::from_stream(stream.into_stream()),
    };

    let mut response = AxumResponse::new(body);
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

/// Response sent when the pipeline fails instead of producing a response.
fn error_response(err: &Error) -> AxumResponse {
    let status = err.status();
    let text = match err {
        Error::Http(http) => http.body_text(),
        _ => status.canonical_reason().unwrap_or("Error").to_string(),
    };

    if status.is_server_error() {
        tracing::error!(error = %err, status = status.as_u16(), "Request failed");
    } else {
        tracing::debug!(error = %err, status = status.as_u16(), "Request rejected");
    }

    let mut response = AxumResponse::new(AxumBody::from(text));
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}

/// HTTP server driving a responder chain.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server around `responder`.
    pub fn new(config: &AppConfig, responder: impl Responder) -> Self {
        Self::from_shared(config, Arc::new(responder))
    }

    pub fn from_shared(config: &AppConfig, responder: Arc<dyn Responder>) -> Self {
        let router = Self::build_router(config, PipelineService::from_shared(responder));
        Self { router }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &AppConfig, service: PipelineService) -> Router {
        Router::new()
            .fallback_service(service)
            .layer(RequestBodyLimitLayer::new(config.limits.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs,
            )))
            .layer(TraceLayer::new_for_http())
    }

    /// The router, for in-process use without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve connections from `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
