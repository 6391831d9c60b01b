//! Admission control for external generation calls
//!
//! Every limiter answers one question: may the next call go out now? `admit`
//! waits until the answer is yes and attributes one call to the current window.
//! The check and the increment share one lock; sleeping happens outside it.

mod fixed_window;
mod sliding_window;


pub use fixed_window::FixedWindowLimiter;
pub use sliding_window::SlidingWindowLimiter;

use crate::config::{DispatcherConfig, RateLimitPolicy};
use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time view of a limiter's counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LimiterSnapshot {
    /// Calls attributed to the current window
    pub in_window: u32,
    /// Calls admitted since the limiter was created
    pub admitted_total: u64,
    /// How many times the fixed window counter was reset; zero for other policies
    pub window_resets: u64,
    /// How many times an admission had to sleep before it could be counted
    pub waits: u64,
}

/// Gate in front of the external collaborator
#[async_trait]
pub trait RateLimiter: Send + Sync + Debug {
    /// Wait as needed; on return exactly one more call counts against the window
    async fn admit(&self);

    /// Pacing after a call has been made, before its result is published
    async fn settle(&self) {}

    /// Current counters
    async fn snapshot(&self) -> LimiterSnapshot;
}

/// Limiter that never waits
#[derive(Debug, Default)]
pub struct UnlimitedLimiter {
    admitted: AtomicU64,
}

impl UnlimitedLimiter {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RateLimiter for UnlimitedLimiter {
    async fn admit(&self) {
        self.admitted.fetch_add(1, Ordering::SeqCst);
    }

    async fn snapshot(&self) -> LimiterSnapshot {
        LimiterSnapshot {
            in_window: 0,
            admitted_total: self.admitted.load(Ordering::SeqCst),
            window_resets: 0,
            waits: 0,
        }
    }
}

/// Build the limiter selected by `config.policy`
pub fn build_limiter(config: &DispatcherConfig) -> Arc<dyn RateLimiter> {
    match config.policy {
        RateLimitPolicy::SlidingWindow => Arc::new(SlidingWindowLimiter::new(
            config.max_requests_per_window,
            config.window,
        )),
        RateLimitPolicy::FixedWindow => Arc::new(FixedWindowLimiter::new(
            config.max_requests_per_window,
            config.window,
        )),
        RateLimitPolicy::Unlimited => Arc::new(UnlimitedLimiter::new()),
    }
}
