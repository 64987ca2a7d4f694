use std::sync::atomic::{AtomicI64, Ordering};

use crate::constants::GRAPH_LIMIT;

/// Shared work budget, decremented lock-free by concurrent block scanners.
///
/// The counter is signed on purpose: racing workers may drive it a few steps
/// below zero, and `is_exhausted` must keep answering `true` once it does.
#[derive(Debug)]
pub struct AtomicLimiter {
    counter: AtomicI64,
}

impl AtomicLimiter {
    /// Limiter with the engine-wide transaction ceiling.
    pub fn new() -> Self {
        Self::with_budget(GRAPH_LIMIT)
    }

    /// Limiter with an explicit budget.
    pub fn with_budget(budget: i64) -> Self {
        Self {
            counter: AtomicI64::new(budget),
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.counter.load(Ordering::Relaxed) <= 0
    }

    pub fn consume(&self) {
        self.counter.fetch_sub(1, Ordering::Relaxed);
    }
}

impl Default for AtomicLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_counts_down_to_exhaustion() {
        let limiter = AtomicLimiter::with_budget(3);
        assert!(!limiter.is_exhausted());
        limiter.consume();
        limiter.consume();
        assert!(!limiter.is_exhausted());
        limiter.consume();
        assert!(limiter.is_exhausted());
    }

    #[test]
    fn test_stays_exhausted_below_zero() {
        let limiter = AtomicLimiter::with_budget(1);
        limiter.consume();
        limiter.consume();
        assert!(limiter.is_exhausted());
    }

    #[test]
    fn test_concurrent_consume() {
        let limiter = Arc::new(AtomicLimiter::with_budget(1000));
        let handles: Vec<_> = (0..10)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        limiter.consume();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert!(limiter.is_exhausted());
    }
}
