//! Run-wide admission control for outbound network operations.
//!
//! Every code path that touches the network holds an [`AdmissionToken`] for
//! the duration of the operation. Tokens are released on drop, so early
//! returns and errors can never leak one.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};

/// Shared pool of admission tokens; clones refer to the same pool.
#[derive(Debug, Clone)]
pub struct AdmissionPool {
    semaphore: Arc<Semaphore>,
    counters: Arc<Counters>,
    capacity: usize,
}

#[derive(Debug, Default)]
struct Counters {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl AdmissionPool {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            counters: Arc::new(Counters::default()),
            capacity,
        }
    }

    /// Waits for a free token.
    pub async fn acquire(&self) -> Result<AdmissionToken, AcquireError> {
        let permit = self.semaphore.clone().acquire_owned().await?;

        let now = self.counters.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.counters.peak.fetch_max(now, Ordering::SeqCst);

        Ok(AdmissionToken {
            _permit: permit,
            counters: self.counters.clone(),
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Tokens currently held.
    pub fn in_flight(&self) -> usize {
        self.counters.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of tokens ever held at once.
    pub fn peak(&self) -> usize {
        self.counters.peak.load(Ordering::SeqCst)
    }
}

/// Proof of admission; returns its token to the pool when dropped.
#[derive(Debug)]
pub struct AdmissionToken {
    _permit: OwnedSemaphorePermit,
    counters: Arc<Counters>,
}

impl Drop for AdmissionToken {
    fn drop(&mut self) {
        // Runs before the permit field is dropped, so the count never exceeds capacity.
        self.counters.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn tokens_are_returned_on_drop() {
        let pool = AdmissionPool::new(2);
        {
            let _a = pool.acquire().await.unwrap();
            let _b = pool.acquire().await.unwrap();
            assert_eq!(pool.in_flight(), 2);
        }
        assert_eq!(pool.in_flight(), 0);
        assert_eq!(pool.peak(), 2);
    }

    #[tokio::test]
    async fn tokens_are_returned_on_early_error() {
        async fn failing(pool: &AdmissionPool) -> Result<(), &'static str> {
            let _token = pool.acquire().await.map_err(|_| "closed")?;
            Err("dial refused")
        }

        let pool = AdmissionPool::new(1);
        for _ in 0..5 {
            assert!(failing(&pool).await.is_err());
        }
        assert_eq!(pool.in_flight(), 0);
        assert!(pool.acquire().await.is_ok());
    }

    #[tokio::test]
    async fn concurrent_holders_never_exceed_capacity() {
        let pool = AdmissionPool::new(3);
        let mut handles = Vec::new();
        for _ in 0..32 {
            let pool = pool.clone();
            handles.push(tokio::spawn(async move {
                let _token = pool.acquire().await.unwrap();
                tokio::time::sleep(Duration::from_millis(5)).await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(pool.peak(), 3);
        assert_eq!(pool.in_flight(), 0);
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        assert_eq!(AdmissionPool::new(0).capacity(), 1);
    }
}
