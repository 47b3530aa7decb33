//! Streaming file I/O engine.
//!
//! # Data Flow
//! ```text
//! load_file(path)
//!     → pool.rs (open + size on a blocking thread; failure → 404)
//!     → region < chunk size:  one read, close, Body::Buffer
//!     → region ≥ chunk size:  streamer.rs (one chunk per pull, close at end)
//!
//! open(path) + load_region(file, region)
//!     → same as above, for callers that need the size before choosing a region
//!
//! write_file(body, path)
//!     → pool.rs (create/truncate)
//!     → write_to(file, body)
//!     → one write per buffered chunk, in order
//!     → close, always
//! ```
//!
//! # Design Decisions
//! - Every blocking call goes through the shared `ThreadPool`
//! - Handles are owned by an `OpenFile` guard so they close exactly once,
//!   including when a response stream is abandoned

pub mod handle;
pub mod io;
pub mod pool;
pub mod server;
pub mod streamer;

pub use handle::{FileHandle, FileRegion, OpenFile, SystemFile};
pub use io::FileIO;
pub use pool::ThreadPool;
pub use server::FileServer;
pub use streamer::FileStreamer;
