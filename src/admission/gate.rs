//! Bounded-concurrency gate for conversion work.
//!
//! # Responsibilities
//! - Hold a fixed pool of `max_concurrent` permits
//! - Race permit acquisition against a timeout and a cancellation token
//! - Return permits to the pool when they are dropped

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;

/// How long a request may wait for a conversion slot.
pub const ADMISSION_TIMEOUT: Duration = Duration::from_secs(2);

/// Why a request was not admitted.
#[derive(Debug, thiserror::Error)]
pub enum AdmissionError {
    /// No permit became available before the timeout elapsed.
    #[error("no conversion slot became available within {0:?}")]
    TooManyRequests(Duration),
    /// The request was cancelled while waiting.
    #[error("request cancelled while waiting for a conversion slot")]
    Aborted,
}

/// A fixed-capacity pool of conversion permits.
///
/// Backed by a semaphore, so waiters are woken in FIFO order, but callers
/// must not rely on that.
#[derive(Debug)]
pub struct AdmissionGate {
    permits: Arc<Semaphore>,
    capacity: usize,
}

impl AdmissionGate {
    /// Create a gate with `capacity` permits.
    pub fn new(capacity: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Wait for a permit.
    ///
    /// Resolves to whichever happens first: a permit frees up, `timeout`
    /// elapses, or `cancel` fires. Only the first case takes capacity.
    pub async fn acquire(
        &self,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<Permit, AdmissionError> {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => Err(AdmissionError::Aborted),
            permit = self.permits.clone().acquire_owned() => match permit {
                Ok(permit) => {
                    tracing::trace!(available = self.permits.available_permits(), "Permit acquired");
                    Ok(Permit { _permit: permit })
                }
                // The semaphore is never closed while the gate is alive.
                Err(_) => Err(AdmissionError::Aborted),
            },
            _ = tokio::time::sleep(timeout) => Err(AdmissionError::TooManyRequests(timeout)),
        }
    }

    /// Configured number of permits.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Permits currently free.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Permits currently held by in-flight conversions.
    pub fn in_flight(&self) -> usize {
        self.capacity - self.available()
    }
}

/// The right to run one conversion.
///
/// Dropping the permit hands the slot back to the gate, including when the
/// holder panics.
#[derive(Debug)]
pub struct Permit {
    _permit: OwnedSemaphorePermit,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const SHORT: Duration = Duration::from_millis(50);

    #[tokio::test]
    async fn acquire_up_to_capacity() {
        let gate = AdmissionGate::new(2);
        let cancel = CancellationToken::new();

        let first = gate.acquire(SHORT, &cancel).await.unwrap();
        let second = gate.acquire(SHORT, &cancel).await.unwrap();
        assert_eq!(gate.in_flight(), 2);
        assert_eq!(gate.available(), 0);

        drop(first);
        drop(second);
        assert_eq!(gate.available(), 2);
    }

    #[tokio::test]
    async fn full_gate_times_out() {
        let gate = AdmissionGate::new(1);
        let cancel = CancellationToken::new();
        let _held = gate.acquire(SHORT, &cancel).await.unwrap();

        let err = gate.acquire(SHORT, &cancel).await.unwrap_err();
        assert!(matches!(err, AdmissionError::TooManyRequests(d) if d == SHORT));
        assert_eq!(gate.in_flight(), 1);
    }

    #[tokio::test]
    async fn cancellation_wins_over_waiting() {
        let gate = AdmissionGate::new(1);
        let cancel = CancellationToken::new();
        let _held = gate.acquire(SHORT, &cancel).await.unwrap();

        let waiter = CancellationToken::new();
        waiter.cancel();
        let err = gate.acquire(Duration::from_secs(5), &waiter).await.unwrap_err();
        assert!(matches!(err, AdmissionError::Aborted));
        assert_eq!(gate.available(), 0);
    }

    #[tokio::test]
    async fn waiter_admitted_when_permit_released() {
        let gate = Arc::new(AdmissionGate::new(1));
        let cancel = CancellationToken::new();
        let held = gate.acquire(SHORT, &cancel).await.unwrap();

        let waiter = {
            let gate = gate.clone();
            tokio::spawn(async move {
                let cancel = CancellationToken::new();
                gate.acquire(Duration::from_secs(2), &cancel).await.map(|_| ())
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(held);
        assert!(waiter.await.unwrap().is_ok());
        assert_eq!(gate.available(), 1);
    }

    #[tokio::test]
    async fn permit_released_when_holder_panics() {
        let gate = Arc::new(AdmissionGate::new(1));
        let cancel = CancellationToken::new();
        let permit = gate.acquire(SHORT, &cancel).await.unwrap();

        let result = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            panic!("conversion blew up");
        })
        .await;

        assert!(result.is_err());
        assert_eq!(gate.available(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn never_more_than_capacity_in_flight() {
        let gate = Arc::new(AdmissionGate::new(3));
        let inside = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut tasks = Vec::new();
        for _ in 0..24 {
            let gate = gate.clone();
            let inside = inside.clone();
            let peak = peak.clone();
            tasks.push(tokio::spawn(async move {
                let cancel = CancellationToken::new();
                let _permit = gate.acquire(Duration::from_secs(10), &cancel).await.unwrap();
                let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                inside.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        assert!(peak.load(Ordering::SeqCst) <= 3);
        assert_eq!(gate.available(), 3);
    }
}
