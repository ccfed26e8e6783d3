//! Bulkhead for CPU-bound work.
//!
//! Jobs run on tokio's blocking pool, but at most `max_concurrent` of them at a time;
//! extra callers wait for a permit instead of piling onto the blocking pool.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::debug;

#[derive(Debug, Error)]
pub enum BulkheadError {
    #[error("bulkhead {0} is closed")]
    Closed(String),
    #[error("job in bulkhead {0} panicked")]
    Panicked(String),
    #[error("job in bulkhead {0} was cancelled")]
    Cancelled(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkheadStats {
    pub in_flight: usize,
    pub available: usize,
    pub max_concurrent: usize,
}

#[derive(Debug, Clone)]
pub struct Bulkhead {
    name: Arc<str>,
    max_concurrent: usize,
    permits: Arc<Semaphore>,
    in_flight: Arc<AtomicUsize>,
}

struct InFlightGuard(Arc<AtomicUsize>);

impl Drop for InFlightGuard {
    fn drop(&mut self) { self.0.fetch_sub(1, Ordering::SeqCst); }
}

impl Bulkhead {
    pub fn new(name: impl Into<String>, max_concurrent: usize) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            name: Arc::from(name.into()),
            max_concurrent,
            permits: Arc::new(Semaphore::new(max_concurrent)),
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Waits for a permit, then runs `job` on a blocking thread.
    /// The permit is held until the job returns, even if the caller stops waiting.
    pub async fn run_blocking<F, T>(&self, job: F) -> Result<T, BulkheadError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let permit = self.permits.clone().acquire_owned().await.map_err(|_| BulkheadError::Closed(self.name.to_string()))?;
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        let guard = InFlightGuard(self.in_flight.clone());
        debug!(bulkhead = %self.name, available = self.permits.available_permits(), "permit acquired");
        let handle = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let _guard = guard;
            job()
        });
        handle.await.map_err(|e| {
            if e.is_panic() { BulkheadError::Panicked(self.name.to_string()) } else { BulkheadError::Cancelled(self.name.to_string()) }
        })
    }

    pub fn stats(&self) -> BulkheadStats {
        BulkheadStats {
            in_flight: self.in_flight.load(Ordering::SeqCst),
            available: self.permits.available_permits(),
            max_concurrent: self.max_concurrent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn never_exceeds_permits() {
        let bh = Bulkhead::new("test", 2);
        let current = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let mut tasks = Vec::new();
        for _ in 0..8 {
            let bh = bh.clone();
            let current = current.clone();
            let peak = peak.clone();
            tasks.push(tokio::spawn(async move {
                bh.run_blocking(move || {
                    let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    std::thread::sleep(Duration::from_millis(20));
                    current.fetch_sub(1, Ordering::SeqCst);
                })
                .await
            }));
        }
        for t in tasks { t.await.unwrap().unwrap(); }
        let peak = peak.load(Ordering::SeqCst);
        assert!(peak >= 1 && peak <= 2, "peak concurrency {peak}");
        assert_eq!(bh.stats(), BulkheadStats { in_flight: 0, available: 2, max_concurrent: 2 });
    }

    #[tokio::test]
    async fn panic_only_fails_its_own_job() {
        let bh = Bulkhead::new("panicky", 1);
        let err = bh.run_blocking(|| -> u32 { panic!("boom") }).await.unwrap_err();
        assert!(matches!(err, BulkheadError::Panicked(ref n) if n == "panicky"));
        assert_eq!(bh.run_blocking(|| 7u32).await.unwrap(), 7);
        assert_eq!(bh.stats().in_flight, 0);
        assert_eq!(bh.stats().available, 1);
    }

    #[test]
    fn zero_capacity_rounds_up() {
        assert_eq!(Bulkhead::new("z", 0).stats().max_concurrent, 1);
    }
}
