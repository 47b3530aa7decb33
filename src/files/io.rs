//! Loading files into response bodies and writing bodies to files.

use std::io;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;

use crate::config::FilesConfig;
use crate::error::{HttpError, Result};
use crate::files::handle::{FileHandle, FileRegion, OpenFile, SystemFile};
use crate::files::pool::ThreadPool;
use crate::files::streamer::FileStreamer;
use crate::http::body::{Body, BodyStream, StreamChunk};

/// Reads and writes files without blocking request tasks.
///
/// Regions smaller than the chunk size are read in one operation and
/// returned as a buffer. Anything larger is returned as a stream that reads
/// one chunk per pull, so memory use is bounded by the chunk size.
#[derive(Debug, Clone)]
pub struct FileIO {
    pool: ThreadPool,
    chunk_size: usize,
}

impl FileIO {
    pub const DEFAULT_CHUNK_SIZE: usize = 128 * 1024;

    pub fn new(pool: ThreadPool, chunk_size: usize) -> Self {
        Self {
            pool,
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn from_config(config: &FilesConfig) -> Self {
        Self::new(ThreadPool::new(config.max_blocking_ops), config.chunk_size)
    }

    pub fn pool(&self) -> &ThreadPool {
        &self.pool
    }

    /// Load a whole file.
    ///
    /// Any failure to open the file is reported as 404; the cause is logged
    /// at debug level and dropped.
    pub async fn load_file(&self, path: impl AsRef<Path>) -> Result<Body> {
        let path = path.as_ref();
        let (file, size) = self.open(path).await?;
        tracing::debug!(file = %path.display(), size, "[FileIO] GET");
        self.load_region(file, FileRegion::whole(size)).await
    }

    /// Load part of a file. `range` is inclusive and is clamped to the file.
    ///
    /// Returns the body and the total size of the file.
    pub async fn load_file_range(
        &self,
        path: impl AsRef<Path>,
        range: RangeInclusive<u64>,
    ) -> Result<(Body, u64)> {
        let path = path.as_ref();
        let (file, size) = self.open(path).await?;
        let region = FileRegion::clamped(range, size);
        tracing::debug!(
            file = %path.display(),
            size,
            start = region.start,
            end = region.end,
            "[FileIO] GET range"
        );
        Ok((self.load_region(file, region).await?, size))
    }

    /// Open a file for reading and report its size at open time.
    ///
    /// Any failure is reported as 404, like the load operations. The caller
    /// owns the returned handle and passes it to [`FileIO::load_region`] or
    /// closes it.
    pub async fn open(&self, path: impl AsRef<Path>) -> Result<(OpenFile, u64)> {
        let path = path.as_ref();
        let owned = path.to_path_buf();
        let opened = self
            .pool
            .run(move || {
                let file = SystemFile::open_read(&owned)?;
                let size = file.size()?;
                Ok((file, size))
            })
            .await;

        match opened {
            Ok((file, size)) => Ok((OpenFile::new(Arc::new(file)), size)),
            Err(err) => {
                tracing::debug!(file = %path.display(), error = %err, "[FileIO] open failed");
                Err(HttpError::not_found().into())
            }
        }
    }

    /// Load `region` of an open file as a buffer or a stream.
    ///
    /// The buffer path closes the handle before returning; the stream path
    /// hands it to the streamer.
    pub async fn load_region(&self, file: OpenFile, region: FileRegion) -> Result<Body> {
        if region.len() >= self.chunk_size as u64 {
            return Ok(Body::stream(FileStreamer::new(
                file,
                region,
                self.chunk_size,
                self.pool.clone(),
            )));
        }

        let handle = file.handle();
        let len = region.len() as usize;
        let read = self
            .pool
            .run(move || handle.read_at(region.start, len))
            .await;
        let closed = file.close();
        let bytes = read?;
        if let Err(err) = closed {
            tracing::warn!(error = %err, "Failed to close file after read");
        }
        Ok(Body::Buffer(bytes))
    }

    /// Write a buffer or a stream to `path`, creating or truncating it.
    pub async fn write_file(&self, contents: Body, path: impl AsRef<Path>) -> Result<()> {
        let path: PathBuf = path.as_ref().to_path_buf();
        let open_path = path.clone();
        let handle = self
            .pool
            .run(move || SystemFile::create_write(&open_path))
            .await?;
        tracing::debug!(file = %path.display(), streamed = contents.is_stream(), "[FileIO] PUT");
        self.write_to(OpenFile::new(Arc::new(handle)), contents).await
    }

    /// Write `contents` through an open handle, then close it.
    ///
    /// Stream chunks are pulled one at a time; the next chunk is not pulled
    /// until the previous write has finished. The handle is closed after the
    /// last write attempt whether or not it succeeded.
    pub(crate) async fn write_to(&self, file: OpenFile, contents: Body) -> Result<()> {
        let written = self.write_contents(&file, contents).await;
        let closed = file.close();
        written?;
        closed?;
        Ok(())
    }

    async fn write_contents(&self, file: &OpenFile, contents: Body) -> io::Result<()> {
        match contents {
            Body::Buffer(bytes) => self.write_chunk(file, bytes).await,
            Body::Stream(mut stream) => self.write_stream(file, &mut stream).await,
        }
    }

    async fn write_stream(&self, file: &OpenFile, stream: &mut BodyStream) -> io::Result<()> {
        loop {
            match stream.read().await? {
                StreamChunk::Data(chunk) => self.write_chunk(file, chunk).await?,
                StreamChunk::End => return Ok(()),
            }
        }
    }

    async fn write_chunk(&self, file: &OpenFile, chunk: Bytes) -> io::Result<()> {
        if chunk.is_empty() {
            return Ok(());
        }
        let handle = file.handle();
        self.pool.run(move || handle.write(&chunk)).await
    }
}

impl Default for FileIO {
    fn default() -> Self {
        Self::new(ThreadPool::default(), Self::DEFAULT_CHUNK_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::http::body::BodyStreamer;
    use futures_util::future::BoxFuture;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    type Events = Arc<Mutex<Vec<&'static str>>>;

    /// Write-only handle that logs each write and counts closes.
    struct RecordingFile {
        events: Events,
        data: Mutex<Vec<u8>>,
        fail_writes: bool,
        closes: Arc<AtomicUsize>,
    }

    impl FileHandle for RecordingFile {
        fn size(&self) -> io::Result<u64> {
            Ok(self.data.lock().unwrap().len() as u64)
        }

        fn read_at(&self, _offset: u64, _len: usize) -> io::Result<Bytes> {
            Err(io::Error::other("write only"))
        }

        fn write(&self, data: &[u8]) -> io::Result<()> {
            self.events.lock().unwrap().push("write:start");
            std::thread::sleep(Duration::from_millis(10));
            self.events.lock().unwrap().push("write:end");
            if self.fail_writes {
                return Err(io::Error::other("disk full"));
            }
            self.data.lock().unwrap().extend_from_slice(data);
            Ok(())
        }

        fn close(&self) -> io::Result<()> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    /// Body that logs every pull.
    struct ScriptedBody {
        events: Events,
        chunks: VecDeque<io::Result<Bytes>>,
    }

    impl BodyStreamer for ScriptedBody {
        fn read(&mut self) -> BoxFuture<'_, io::Result<StreamChunk>> {
            Box::pin(async move {
                self.events.lock().unwrap().push("pull");
                match self.chunks.pop_front() {
                    Some(Ok(chunk)) => Ok(StreamChunk::Data(chunk)),
                    Some(Err(err)) => Err(err),
                    None => Ok(StreamChunk::End),
                }
            })
        }
    }

    struct Fixture {
        events: Events,
        closes: Arc<AtomicUsize>,
        file: Arc<RecordingFile>,
    }

    impl Fixture {
        fn new(fail_writes: bool) -> Self {
            let events = Events::default();
            let closes = Arc::new(AtomicUsize::new(0));
            let file = Arc::new(RecordingFile {
                events: Arc::clone(&events),
                data: Mutex::new(Vec::new()),
                fail_writes,
                closes: Arc::clone(&closes),
            });
            Self {
                events,
                closes,
                file,
            }
        }

        fn open(&self) -> OpenFile {
            OpenFile::new(Arc::clone(&self.file) as Arc<dyn FileHandle>)
        }

        fn body(&self, chunks: Vec<io::Result<Bytes>>) -> Body {
            Body::stream(ScriptedBody {
                events: Arc::clone(&self.events),
                chunks: chunks.into(),
            })
        }

        fn events(&self) -> Vec<&'static str> {
            self.events.lock().unwrap().clone()
        }

        fn closes(&self) -> usize {
            self.closes.load(Ordering::SeqCst)
        }
    }

    fn engine() -> FileIO {
        FileIO::new(ThreadPool::new(4), 16)
    }

    #[tokio::test]
    async fn next_chunk_is_pulled_only_after_the_write_finishes() {
        let fixture = Fixture::new(false);
        let body = fixture.body(vec![
            Ok(Bytes::from_static(b"ab")),
            Ok(Bytes::from_static(b"cd")),
        ]);

        engine().write_to(fixture.open(), body).await.unwrap();

        assert_eq!(
            fixture.events(),
            vec![
                "pull",
                "write:start",
                "write:end",
                "pull",
                "write:start",
                "write:end",
                "pull"
            ]
        );
        assert_eq!(&fixture.file.data.lock().unwrap()[..], b"abcd");
        assert_eq!(fixture.closes(), 1);
    }

    #[tokio::test]
    async fn failing_stream_closes_once() {
        let fixture = Fixture::new(false);
        let body = fixture.body(vec![
            Ok(Bytes::from_static(b"ab")),
            Err(io::Error::other("reset by peer")),
            Ok(Bytes::from_static(b"never")),
        ]);

        let err = engine().write_to(fixture.open(), body).await.unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(
            fixture.events(),
            vec!["pull", "write:start", "write:end", "pull"]
        );
        assert_eq!(fixture.closes(), 1);
    }

    #[tokio::test]
    async fn failing_write_stops_pulling_and_closes_once() {
        let fixture = Fixture::new(true);
        let body = fixture.body(vec![
            Ok(Bytes::from_static(b"ab")),
            Ok(Bytes::from_static(b"cd")),
        ]);

        let err = engine().write_to(fixture.open(), body).await.unwrap_err();
        assert!(matches!(err, Error::Io(ref e) if e.to_string() == "disk full"));
        assert_eq!(fixture.events(), vec!["pull", "write:start", "write:end"]);
        assert_eq!(fixture.closes(), 1);
    }

    #[tokio::test]
    async fn failing_buffer_write_closes_once() {
        let fixture = Fixture::new(true);

        let err = engine()
            .write_to(fixture.open(), Body::from("payload"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(fixture.closes(), 1);
    }

    #[tokio::test]
    async fn open_failure_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = engine().open(dir.path().join("absent")).await.unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::NOT_FOUND);
    }
}
