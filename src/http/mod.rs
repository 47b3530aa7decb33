//! HTTP value types and the transport adapter.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum, tower layers, convert to pipeline Request)
//!     → request.rs (request ID, span, extensions)
//!     → [responder chain built by the middleware group]
//!     → response.rs (status, headers, buffer or stream body)
//!     → server.rs (convert back, stream body to the client)
//! ```

pub mod body;
pub mod request;
pub mod responder;
pub mod response;
pub mod server;

pub use body::{Body, BodyStream, BodyStreamer, StreamChunk};
pub use request::{Request, RequestContext, RequestHead, RequestId};
pub use responder::{handler, HandlerResponder, Responder};
pub use response::{Response, ResponsePatch, ToResponse};
pub use server::{HttpServer, PipelineService};
