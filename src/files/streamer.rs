//! Chunked, pull-based reader over a file region.

use std::io;

use futures_util::future::BoxFuture;

use crate::files::handle::{FileRegion, OpenFile};
use crate::files::pool::ThreadPool;
use crate::http::body::{BodyStreamer, StreamChunk};

/// Streams a file region one chunk per pull.
///
/// State is the next offset, the end offset, and the handle while it is
/// open. The handle is closed when the region is exhausted, when a read
/// fails, or when the streamer is dropped, whichever happens first.
#[derive(Debug)]
pub struct FileStreamer {
    file: Option<OpenFile>,
    offset: u64,
    end: u64,
    chunk_size: usize,
    pool: ThreadPool,
}

impl FileStreamer {
    pub fn new(file: OpenFile, region: FileRegion, chunk_size: usize, pool: ThreadPool) -> Self {
        Self {
            file: Some(file),
            offset: region.start,
            end: region.end,
            chunk_size: chunk_size.max(1),
            pool,
        }
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    fn close(&mut self) {
        if let Some(file) = self.file.take() {
            if let Err(err) = file.close() {
                tracing::warn!(error = %err, "Failed to close streamed file");
            }
        }
    }
}

impl BodyStreamer for FileStreamer {
    fn read(&mut self) -> BoxFuture<'_, io::Result<StreamChunk>> {
        Box::pin(async move {
            let Some(file) = self.file.as_ref() else {
                return Ok(StreamChunk::End);
            };
            let bytes_left = self.end.saturating_sub(self.offset);
            if bytes_left == 0 {
                self.close();
                return Ok(StreamChunk::End);
            }

            let len = bytes_left.min(self.chunk_size as u64) as usize;
            let offset = self.offset;
            // Advance by the requested length; a short read is not re-issued.
            self.offset += len as u64;

            let handle = file.handle();
            let result = self.pool.run(move || handle.read_at(offset, len)).await;
            match result {
                Ok(chunk) => Ok(StreamChunk::Data(chunk)),
                Err(err) => {
                    tracing::debug!(error = %err, offset, "File read failed mid-stream");
                    self.close();
                    Err(err)
                }
            }
        })
    }
}
