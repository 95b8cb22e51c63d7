//! Rate limiting contract and the default in-memory limiter
//!
//! The proxy only consumes a `RateLimitDecision`; quota bookkeeping lives
//! behind the `RateLimiter` trait. The shipped implementation is a
//! fixed-window counter per client/bucket pair with atomic
//! check-and-increment under a mutex. State is per-instance only; replicas
//! do not coordinate.

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Allow/deny plus an optional retry-after hint in whole seconds
/// (rounded up).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub retry_after: Option<u64>,
}

impl RateLimitDecision {
    pub fn allow() -> Self {
        Self {
            allowed: true,
            retry_after: None,
        }
    }

    pub fn deny(retry_after: Option<u64>) -> Self {
        Self {
            allowed: false,
            retry_after,
        }
    }
}

/// Per-client, per-bucket quota check.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    async fn check(&self, client_id: &str, bucket: &str) -> RateLimitDecision;
}

#[derive(Clone)]
struct WindowBucket {
    count: u32,
    reset_at: Instant,
}

impl WindowBucket {
    fn new(window: Duration) -> Self {
        Self {
            count: 0,
            reset_at: Instant::now() + window,
        }
    }

    fn check_and_increment(&mut self, limit: u32, window: Duration) -> bool {
        let now = Instant::now();

        // Reset if window expired
        if now >= self.reset_at {
            self.count = 0;
            self.reset_at = now + window;
        }

        if self.count < limit {
            self.count += 1;
            true
        } else {
            false
        }
    }

    fn reset_in(&self) -> Duration {
        self.reset_at.saturating_duration_since(Instant::now())
    }
}

/// Fixed-window in-memory rate limiter.
pub struct FixedWindowLimiter {
    buckets: Mutex<HashMap<String, WindowBucket>>,
    limit: u32,
    window: Duration,
    max_buckets: usize,
}

impl FixedWindowLimiter {
    pub fn new(limit_per_minute: u32) -> Self {
        Self::with_window(limit_per_minute, Duration::from_secs(60))
    }

    pub fn with_window(limit: u32, window: Duration) -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
            limit,
            window,
            max_buckets: 10_000,
        }
    }
}

#[async_trait]
impl RateLimiter for FixedWindowLimiter {
    async fn check(&self, client_id: &str, bucket: &str) -> RateLimitDecision {
        let key = format!("{}:{}", bucket, client_id);
        let mut buckets = self.buckets.lock().await;

        // Drop stale counters once the table grows past its bound so
        // one-off clients cannot leak memory forever.
        if buckets.len() >= self.max_buckets {
            let now = Instant::now();
            let before = buckets.len();
            buckets.retain(|_, b| b.reset_at > now);
            tracing::debug!(
                cleaned = before - buckets.len(),
                "Cleaned up expired rate limit buckets"
            );
        }

        let entry = buckets
            .entry(key)
            .or_insert_with(|| WindowBucket::new(self.window));

        if entry.check_and_increment(self.limit, self.window) {
            RateLimitDecision::allow()
        } else {
            // Round the hint up; a 0-second hint would invite an
            // immediately-denied retry.
            let secs = entry.reset_in().as_secs_f64().ceil() as u64;
            RateLimitDecision::deny(Some(secs.max(1)))
        }
    }
}
