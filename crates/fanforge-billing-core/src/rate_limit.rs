//! Per-viewer checkout rate limiting using the governor crate.

use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::Arc;

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use tokio::sync::RwLock;

use fanforge_types::ViewerId;

use crate::error::BillingError;

type DirectLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Per-viewer rate limiter for checkout initiation.
///
/// Bounds the number of checkout sessions a single viewer can open per
/// minute. This caps abuse of the payment backend; it is not a substitute
/// for idempotency, which handles retries of the same attempt.
pub struct CheckoutRateLimiter {
    limiters: RwLock<HashMap<ViewerId, Arc<DirectLimiter>>>,
    quota: Quota,
}

impl CheckoutRateLimiter {
    /// Create a limiter allowing `attempts_per_minute` per viewer.
    ///
    /// A zero rate is clamped to one attempt per minute.
    #[must_use]
    pub fn new(attempts_per_minute: u32) -> Self {
        let rate = NonZeroU32::new(attempts_per_minute).unwrap_or(NonZeroU32::MIN);
        Self {
            limiters: RwLock::new(HashMap::new()),
            quota: Quota::per_minute(rate),
        }
    }

    /// Check if a checkout attempt is allowed for this viewer.
    pub async fn check(&self, viewer_id: ViewerId) -> Result<(), BillingError> {
        // Get or create rate limiter for this viewer
        let limiter = {
            let read_guard = self.limiters.read().await;
            if let Some(limiter) = read_guard.get(&viewer_id) {
                limiter.clone()
            } else {
                drop(read_guard);

                let mut write_guard = self.limiters.write().await;
                // Double-check after acquiring write lock
                if let Some(limiter) = write_guard.get(&viewer_id) {
                    limiter.clone()
                } else {
                    let limiter = Arc::new(RateLimiter::direct(self.quota));
                    write_guard.insert(viewer_id, limiter.clone());
                    limiter
                }
            }
        };

        limiter.check().map_err(|_| BillingError::RateLimited)
    }

    /// Number of viewers with active limiters.
    pub async fn limiter_count(&self) -> usize {
        self.limiters.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_allows_within_quota() {
        let limiter = CheckoutRateLimiter::new(10);
        let viewer = ViewerId::new();

        for _ in 0..10 {
            assert!(limiter.check(viewer).await.is_ok());
        }
    }

    #[tokio::test]
    async fn test_rejects_over_quota() {
        let limiter = CheckoutRateLimiter::new(2);
        let viewer = ViewerId::new();

        assert!(limiter.check(viewer).await.is_ok());
        assert!(limiter.check(viewer).await.is_ok());
        assert!(matches!(
            limiter.check(viewer).await,
            Err(BillingError::RateLimited)
        ));
    }

    #[tokio::test]
    async fn test_limits_are_per_viewer() {
        let limiter = CheckoutRateLimiter::new(1);
        let first = ViewerId::new();
        let second = ViewerId::new();

        assert!(limiter.check(first).await.is_ok());
        assert!(limiter.check(second).await.is_ok());
        assert_eq!(limiter.limiter_count().await, 2);
    }
}
