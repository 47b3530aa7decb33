//! Bounded pool for blocking file operations.

use std::io;
use std::sync::Arc;

use tokio::sync::Semaphore;

/// Runs blocking work on Tokio's blocking threads, with a cap on how many
/// operations are in flight at once.
///
/// Cloning shares the cap; this is the one resource shared across requests.
#[derive(Debug, Clone)]
pub struct ThreadPool {
    permits: Arc<Semaphore>,
    max_in_flight: usize,
}

impl ThreadPool {
    pub fn new(max_in_flight: usize) -> Self {
        let max_in_flight = max_in_flight.max(1);
        Self {
            permits: Arc::new(Semaphore::new(max_in_flight)),
            max_in_flight,
        }
    }

    /// Run `op` on a blocking thread and wait for its result.
    pub async fn run<F, T>(&self, op: F) -> io::Result<T>
    where
        F: FnOnce() -> io::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let _permit = self.permits.acquire().await.map_err(io::Error::other)?;
        tokio::task::spawn_blocking(op)
            .await
            .map_err(io::Error::other)?
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight
    }

    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }
}

impl Default for ThreadPool {
    fn default() -> Self {
        Self::new(64)
    }
}
