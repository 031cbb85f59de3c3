//! Count of successful conversions.

use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide conversion counter. Starts at zero, never persisted.
///
/// Reads are snapshots; no ordering with other requests is implied.
#[derive(Debug, Default)]
pub struct RequestCounter(AtomicU64);

impl RequestCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one successful conversion.
    pub fn increment(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn read(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn starts_at_zero_and_counts() {
        let counter = RequestCounter::new();
        assert_eq!(counter.read(), 0);
        counter.increment();
        counter.increment();
        counter.increment();
        assert_eq!(counter.read(), 3);
    }

    #[test]
    fn concurrent_increments_are_not_lost() {
        let counter = Arc::new(RequestCounter::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let counter = counter.clone();
                std::thread::spawn(move || {
                    let mut last = 0;
                    for _ in 0..1000 {
                        counter.increment();
                        let now = counter.read();
                        assert!(now >= last);
                        last = now;
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(counter.read(), 8000);
    }
}
