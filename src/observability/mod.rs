//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Pipeline stages and file I/O produce:
//!     → logging.rs (structured events inside the per-request span)
//!     → metrics.rs (request counters and latency histograms)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Every request runs inside a span carrying its request ID
//! - Metrics go through the `metrics` facade; with no recorder installed
//!   they are no-ops

pub mod logging;
pub mod metrics;
