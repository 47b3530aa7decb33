//! Error types shared by the pipeline and the file I/O engine.

use axum::http::StatusCode;
use thiserror::Error;

/// An error that maps directly onto an HTTP status.
///
/// Handlers and middleware return this when the failure has a meaning the
/// client should see (404, 401, 416, ...). The optional message becomes the
/// response body.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("HTTP {status}")]
pub struct HttpError {
    status: StatusCode,
    message: Option<String>,
}

impl HttpError {
    pub fn new(status: StatusCode) -> Self {
        Self { status, message: None }
    }

    pub fn with_message(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: Some(message.into()),
        }
    }

    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Body text sent to the client: the message, or the canonical reason.
    pub fn body_text(&self) -> String {
        match &self.message {
            Some(message) => message.clone(),
            None => self
                .status
                .canonical_reason()
                .unwrap_or("Unknown Status")
                .to_string(),
        }
    }
}

/// Errors produced while processing a request.
#[derive(Debug, Error)]
pub enum Error {
    /// Failure with an explicit HTTP status.
    #[error(transparent)]
    Http(#[from] HttpError),

    /// I/O failure outside the normalised not-found boundary.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A typed request extension was required but never attached.
    #[error("missing request extension `{0}`")]
    MissingExtension(&'static str),

    /// Any other handler or middleware failure.
    #[error("{0}")]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    pub fn other(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Error::Other(err.into())
    }

    /// Status the transport should answer with for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Error::Http(err) => err.status(),
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StatusCode> for Error {
    fn from(status: StatusCode) -> Self {
        Error::Http(HttpError::new(status))
    }
}

/// Result type for pipeline operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;
