//! Terminal responder serving a directory tree.
//!
//! # Responsibilities
//! - Map request paths onto files under a root directory
//! - Answer GET/HEAD with whole files or single byte ranges
//! - Accept PUT uploads when enabled
//!
//! # Design Decisions
//! - Paths containing `..` never reach the filesystem
//! - Only single-range `Range` headers are honoured; anything unparseable
//!   falls back to the whole file

use std::path::{Path, PathBuf};

use axum::http::{header, HeaderValue, Method, StatusCode};
use futures_util::future::BoxFuture;

use crate::error::{HttpError, Result};
use crate::files::handle::FileRegion;
use crate::files::io::FileIO;
use crate::http::{Request, Responder, Response};

const INDEX_FILE: &str = "index.html";
const ALLOW_READ: &str = "GET, HEAD";
const ALLOW_READ_WRITE: &str = "GET, HEAD, PUT";

/// Serves files from `root` through a [`FileIO`].
#[derive(Debug, Clone)]
pub struct FileServer {
    root: PathBuf,
    files: FileIO,
    allow_uploads: bool,
}

impl FileServer {
    pub fn new(root: impl Into<PathBuf>, files: FileIO) -> Self {
        Self {
            root: root.into(),
            files,
            allow_uploads: false,
        }
    }

    pub fn allow_uploads(mut self, allow: bool) -> Self {
        self.allow_uploads = allow;
        self
    }

    fn allowed_methods(&self) -> &'static str {
        if self.allow_uploads {
            ALLOW_READ_WRITE
        } else {
            ALLOW_READ
        }
    }

    async fn serve(&self, request: Request) -> Result<Response> {
        let Some(path) = resolve_path(&self.root, request.path()) else {
            tracing::debug!(path = %request.path(), "Rejected path outside root");
            return Err(HttpError::not_found().into());
        };

        let method = request.method().clone();
        match method {
            Method::GET | Method::HEAD => {
                let range = request.header(header::RANGE).and_then(ByteRange::parse);
                self.read(&path, range, method == Method::HEAD).await
            }
            Method::PUT if self.allow_uploads => self.upload(request, path).await,
            _ => Ok(Response::new(StatusCode::METHOD_NOT_ALLOWED).with_header(
                header::ALLOW,
                HeaderValue::from_static(self.allowed_methods()),
            )),
        }
    }

    /// Headers and body both come from a single open of `path`, so the
    /// advertised lengths match what is sent.
    async fn read(
        &self,
        path: &Path,
        range: Option<ByteRange>,
        head_only: bool,
    ) -> Result<Response> {
        let (file, size) = self.files.open(path).await?;

        let (mut response, region) = match range {
            None => (
                Response::new(StatusCode::OK).with_header(header::CONTENT_LENGTH, size.into()),
                FileRegion::whole(size),
            ),
            Some(range) => {
                let Some((start, end)) = range.resolve(size) else {
                    file.close()?;
                    return Ok(Response::new(StatusCode::RANGE_NOT_SATISFIABLE).with_header(
                        header::CONTENT_RANGE,
                        header_value(format!("bytes */{size}"))?,
                    ));
                };
                let region = FileRegion::clamped(start..=end, size);
                let response = Response::new(StatusCode::PARTIAL_CONTENT)
                    .with_header(
                        header::CONTENT_RANGE,
                        header_value(format!("bytes {start}-{end}/{size}"))?,
                    )
                    .with_header(header::CONTENT_LENGTH, region.len().into());
                (response, region)
            }
        };

        if head_only {
            file.close()?;
        } else {
            let body = self.files.load_region(file, region).await?;
            response = response.with_body(body);
        }

        let headers = response.headers_mut();
        headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type(path)));
        Ok(response)
    }

    async fn upload(&self, request: Request, path: PathBuf) -> Result<Response> {
        let probe = path.clone();
        let existed = self.files.pool().run(move || Ok(probe.is_file())).await?;

        self.files.write_file(request.into_body(), &path).await?;
        tracing::info!(file = %path.display(), replaced = existed, "Stored upload");

        let status = if existed {
            StatusCode::NO_CONTENT
        } else {
            StatusCode::CREATED
        };
        Ok(Response::new(status))
    }
}

impl Responder for FileServer {
    fn respond(&self, request: Request) -> BoxFuture<'_, Result<Response>> {
        Box::pin(self.serve(request))
    }
}

fn header_value(value: String) -> Result<HeaderValue> {
    HeaderValue::try_from(value)
        .map_err(|_| HttpError::new(StatusCode::INTERNAL_SERVER_ERROR).into())
}

/// Join a request path onto `root`, refusing parent-directory segments.
fn resolve_path(root: &Path, request_path: &str) -> Option<PathBuf> {
    let mut path = root.to_path_buf();
    for segment in request_path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => return None,
            s if s.contains('\\') || s.contains('\0') => return None,
            s => path.push(s),
        }
    }
    if request_path.ends_with('/') {
        path.push(INDEX_FILE);
    }
    Some(path)
}

fn content_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());
    match extension.as_deref() {
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js" | "mjs") => "text/javascript; charset=utf-8",
        Some("json") => "application/json",
        Some("txt" | "md") => "text/plain; charset=utf-8",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("wasm") => "application/wasm",
        Some("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
}

/// A single `bytes=` range from a `Range` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ByteRange {
    /// `bytes=a-b`
    Bounded(u64, u64),
    /// `bytes=a-`
    From(u64),
    /// `bytes=-n`
    Suffix(u64),
}

impl ByteRange {
    fn parse(value: &str) -> Option<Self> {
        let spec = value.trim().strip_prefix("bytes=")?;
        if spec.contains(',') {
            return None;
        }
        let (start, end) = spec.split_once('-')?;
        let (start, end) = (start.trim(), end.trim());
        match (start.is_empty(), end.is_empty()) {
            (false, false) => {
                let (start, end) = (start.parse().ok()?, end.parse().ok()?);
                (start <= end).then_some(Self::Bounded(start, end))
            }
            (false, true) => Some(Self::From(start.parse().ok()?)),
            (true, false) => Some(Self::Suffix(end.parse().ok()?)),
            (true, true) => None,
        }
    }

    /// Inclusive `(start, end)` within a file of `size` bytes, or `None`
    /// when the range cannot be satisfied.
    fn resolve(self, size: u64) -> Option<(u64, u64)> {
        let (start, end) = match self {
            Self::Bounded(start, end) => (start, end.min(size.checked_sub(1)?)),
            Self::From(start) => (start, size.checked_sub(1)?),
            Self::Suffix(0) => return None,
            Self::Suffix(len) => (size.saturating_sub(len), size.checked_sub(1)?),
        };
        (start <= end && start < size).then_some((start, end))
    }
}
