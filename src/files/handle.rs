//! File handles, regions, and the close-once guard.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::ops::RangeInclusive;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use bytes::Bytes;

/// Blocking file operations the engine needs.
///
/// Calls block the calling thread; the engine only invokes them on the
/// blocking pool.
pub trait FileHandle: Send + Sync + 'static {
    /// Current file size in bytes.
    fn size(&self) -> io::Result<u64>;

    /// Read up to `len` bytes starting at `offset`. Fewer bytes are returned
    /// only at end of file.
    fn read_at(&self, offset: u64, len: usize) -> io::Result<Bytes>;

    /// Append `data` at the current write position.
    fn write(&self, data: &[u8]) -> io::Result<()>;

    /// Release the underlying descriptor.
    fn close(&self) -> io::Result<()>;
}

/// A [`FileHandle`] over a `std::fs::File`.
#[derive(Debug)]
pub struct SystemFile {
    file: Mutex<Option<File>>,
}

impl SystemFile {
    /// Open a regular file for reading. Directories are rejected.
    pub fn open_read(path: &Path) -> io::Result<Self> {
        let file = File::open(path)?;
        if !file.metadata()?.is_file() {
            return Err(io::Error::new(io::ErrorKind::NotFound, "not a regular file"));
        }
        Ok(Self::from_file(file))
    }

    /// Open for writing, creating the file or truncating an existing one.
    pub fn create_write(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        Ok(Self::from_file(file))
    }

    pub fn from_file(file: File) -> Self {
        Self {
            file: Mutex::new(Some(file)),
        }
    }

    fn lock(&self) -> io::Result<MutexGuard<'_, Option<File>>> {
        self.file
            .lock()
            .map_err(|_| io::Error::other("file handle lock poisoned"))
    }
}

fn closed() -> io::Error {
    io::Error::other("file handle already closed")
}

impl FileHandle for SystemFile {
    fn size(&self) -> io::Result<u64> {
        let guard = self.lock()?;
        let file = guard.as_ref().ok_or_else(closed)?;
        Ok(file.metadata()?.len())
    }

    fn read_at(&self, offset: u64, len: usize) -> io::Result<Bytes> {
        let mut guard = self.lock()?;
        let file = guard.as_mut().ok_or_else(closed)?;
        file.seek(SeekFrom::Start(offset))?;
        let mut buffer = Vec::with_capacity(len);
        file.take(len as u64).read_to_end(&mut buffer)?;
        Ok(Bytes::from(buffer))
    }

    fn write(&self, data: &[u8]) -> io::Result<()> {
        let mut guard = self.lock()?;
        let file = guard.as_mut().ok_or_else(closed)?;
        file.write_all(data)
    }

    fn close(&self) -> io::Result<()> {
        let file = self.lock()?.take();
        drop(file);
        Ok(())
    }
}

/// An open handle that is closed exactly once.
///
/// Either [`OpenFile::close`] is called explicitly, or the guard closes the
/// handle when dropped. Dropping covers early abandonment, such as a client
/// disconnecting halfway through a streamed response.
pub struct OpenFile {
    handle: Arc<dyn FileHandle>,
    closed: bool,
}

impl OpenFile {
    pub fn new(handle: Arc<dyn FileHandle>) -> Self {
        Self {
            handle,
            closed: false,
        }
    }

    /// Shared reference for use on the blocking pool.
    pub fn handle(&self) -> Arc<dyn FileHandle> {
        Arc::clone(&self.handle)
    }

    pub fn close(mut self) -> io::Result<()> {
        self.closed = true;
        self.handle.close()
    }
}

impl Drop for OpenFile {
    fn drop(&mut self) {
        if !self.closed {
            self.closed = true;
            tracing::trace!("Closing abandoned file handle");
            if let Err(err) = self.handle.close() {
                tracing::warn!(error = %err, "Failed to close file handle");
            }
        }
    }
}

impl fmt::Debug for OpenFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenFile")
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

/// Readable byte range `[start, end)` of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileRegion {
    pub start: u64,
    pub end: u64,
}

impl FileRegion {
    /// The whole file.
    pub fn whole(size: u64) -> Self {
        Self {
            start: 0,
            end: size,
        }
    }

    /// Clamp an inclusive byte range to a file of `size` bytes.
    ///
    /// A range past the end of the file, or a reversed range, yields an
    /// empty region.
    pub fn clamped(range: RangeInclusive<u64>, size: u64) -> Self {
        let start = (*range.start()).min(size);
        let end = range.end().saturating_add(1).min(size).max(start);
        Self { start, end }
    }

    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
