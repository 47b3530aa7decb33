//! Request and response bodies.
//!
//! A body is either a single in-memory buffer or a lazy, pull-based stream
//! of chunks. Streams are consumed at most once: a stage that needs the
//! whole payload collects it and passes a buffer onward.

use std::fmt;
use std::io;

use bytes::{Bytes, BytesMut};
use futures_util::future::BoxFuture;
use futures_util::stream::{self, BoxStream, Stream, StreamExt};

/// Result of a single pull from a body stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamChunk {
    /// Next chunk of data.
    Data(Bytes),
    /// The source is exhausted.
    End,
}

/// A pull-based producer of body chunks.
///
/// `read` must not be called again after it has returned `End` or an error.
/// [`BodyStream`] upholds this for every streamer it wraps.
pub trait BodyStreamer: Send + 'static {
    fn read(&mut self) -> BoxFuture<'_, io::Result<StreamChunk>>;
}

/// Adapts a `futures` stream into a [`BodyStreamer`].
struct StreamAdapter {
    inner: BoxStream<'static, io::Result<Bytes>>,
}

impl BodyStreamer for StreamAdapter {
    fn read(&mut self) -> BoxFuture<'_, io::Result<StreamChunk>> {
        Box::pin(async move {
            match self.inner.next().await {
                Some(Ok(chunk)) => Ok(StreamChunk::Data(chunk)),
                Some(Err(err)) => Err(err),
                None => Ok(StreamChunk::End),
            }
        })
    }
}

/// An owned, single-use stream body.
pub struct BodyStream {
    streamer: Box<dyn BodyStreamer>,
    finished: bool,
}

impl BodyStream {
    pub fn new(streamer: impl BodyStreamer) -> Self {
        Self {
            streamer: Box::new(streamer),
            finished: false,
        }
    }

    /// Wrap a `futures` stream of byte chunks.
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = io::Result<Bytes>> + Send + 'static,
    {
        Self::new(StreamAdapter {
            inner: stream.boxed(),
        })
    }

    /// Pull the next chunk.
    ///
    /// Once the underlying streamer has reported `End` or an error it is
    /// never polled again; further reads return `End`.
    pub async fn read(&mut self) -> io::Result<StreamChunk> {
        if self.finished {
            return Ok(StreamChunk::End);
        }
        let result = self.streamer.read().await;
        if !matches!(result, Ok(StreamChunk::Data(_))) {
            self.finished = true;
        }
        result
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Read every remaining chunk into one buffer.
    pub async fn collect(mut self) -> io::Result<Bytes> {
        let mut buffer = BytesMut::new();
        loop {
            match self.read().await? {
                StreamChunk::Data(chunk) => buffer.extend_from_slice(&chunk),
                StreamChunk::End => return Ok(buffer.freeze()),
            }
        }
    }

    /// Expose the body as a `futures` stream for the transport.
    pub fn into_stream(self) -> impl Stream<Item = io::Result<Bytes>> + Send + 'static {
        stream::unfold(self, |mut body| async move {
            match body.read().await {
                Ok(StreamChunk::Data(chunk)) => Some((Ok(chunk), body)),
                Ok(StreamChunk::End) => None,
                Err(err) => Some((Err(err), body)),
            }
        })
    }
}

impl fmt::Debug for BodyStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BodyStream")
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

/// Payload of a request or response.
#[derive(Debug)]
pub enum Body {
    Buffer(Bytes),
    Stream(BodyStream),
}

impl Body {
    pub fn empty() -> Self {
        Body::Buffer(Bytes::new())
    }

    pub fn stream(streamer: impl BodyStreamer) -> Self {
        Body::Stream(BodyStream::new(streamer))
    }

    pub fn is_stream(&self) -> bool {
        matches!(self, Body::Stream(_))
    }

    /// Buffered contents, if the body is not a stream.
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Body::Buffer(bytes) => Some(bytes),
            Body::Stream(_) => None,
        }
    }

    /// Consume the body into a single buffer.
    pub async fn collect(self) -> io::Result<Bytes> {
        match self {
            Body::Buffer(bytes) => Ok(bytes),
            Body::Stream(stream) => stream.collect().await,
        }
    }
}

impl Default for Body {
    fn default() -> Self {
        Body::empty()
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Body::Buffer(bytes)
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Body::Buffer(Bytes::from(bytes))
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Body::Buffer(Bytes::from(text))
    }
}

impl From<&'static str> for Body {
    fn from(text: &'static str) -> Self {
        Body::Buffer(Bytes::from_static(text.as_bytes()))
    }
}

impl From<BodyStream> for Body {
    fn from(stream: BodyStream) -> Self {
        Body::Stream(stream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Fails if pulled after it reported the end.
    struct Countdown {
        remaining: u8,
        ended: bool,
    }

    impl BodyStreamer for Countdown {
        fn read(&mut self) -> BoxFuture<'_, io::Result<StreamChunk>> {
            Box::pin(async move {
                assert!(!self.ended, "pulled after end of stream");
                if self.remaining == 0 {
                    self.ended = true;
                    return Ok(StreamChunk::End);
                }
                self.remaining -= 1;
                Ok(StreamChunk::Data(Bytes::from(vec![self.remaining])))
            })
        }
    }

    #[tokio::test]
    async fn finished_stream_is_not_pulled_again() {
        let mut body = BodyStream::new(Countdown {
            remaining: 2,
            ended: false,
        });
        assert_eq!(body.read().await.unwrap(), StreamChunk::Data(Bytes::from_static(&[1])));
        assert_eq!(body.read().await.unwrap(), StreamChunk::Data(Bytes::from_static(&[0])));
        assert_eq!(body.read().await.unwrap(), StreamChunk::End);
        assert!(body.is_finished());
        assert_eq!(body.read().await.unwrap(), StreamChunk::End);
    }

    #[tokio::test]
    async fn error_ends_the_stream() {
        let chunks: Vec<io::Result<Bytes>> = vec![
            Ok(Bytes::from_static(b"ab")),
            Err(io::Error::other("broken pipe")),
            Ok(Bytes::from_static(b"never")),
        ];
        let mut body = BodyStream::from_stream(stream::iter(chunks));
        assert!(matches!(body.read().await, Ok(StreamChunk::Data(_))));
        assert!(body.read().await.is_err());
        assert_eq!(body.read().await.unwrap(), StreamChunk::End);
    }

    #[tokio::test]
    async fn collect_concatenates_chunks() {
        let chunks: Vec<io::Result<Bytes>> = vec![
            Ok(Bytes::from_static(b"hello ")),
            Ok(Bytes::from_static(b"world")),
        ];
        let body = Body::Stream(BodyStream::from_stream(stream::iter(chunks)));
        assert_eq!(body.collect().await.unwrap(), Bytes::from_static(b"hello world"));
    }

    #[tokio::test]
    async fn into_stream_stops_after_error() {
        let chunks: Vec<io::Result<Bytes>> = vec![
            Ok(Bytes::from_static(b"x")),
            Err(io::Error::other("boom")),
        ];
        let items: Vec<_> = BodyStream::from_stream(stream::iter(chunks))
            .into_stream()
            .collect()
            .await;
        assert_eq!(items.len(), 2);
        assert!(items[1].is_err());
    }
}
