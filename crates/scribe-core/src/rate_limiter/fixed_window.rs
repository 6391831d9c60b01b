//! Counter-and-reset limiter
//!
//! Once `max` calls have been counted, the next admission sleeps one full
//! window and resets the counter. Every call is then paced by `window / max`.
//! The reset is driven by the sleep, not by wall-clock time, so a burst that
//! straddles a reset can exceed `max` within a real window.

use super::{LimiterSnapshot, RateLimiter};
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{debug, warn};

#[derive(Debug)]
struct FixedWindowState {
    processed_in_window: u32,
    /// Bumped on every reset so concurrent admitters reset only once
    epoch: u64,
    admitted_total: u64,
    waits: u64,
}

/// Fixed window limiter with per-call pacing
#[derive(Debug)]
pub struct FixedWindowLimiter {
    max_requests: u32,
    window: Duration,
    interval: Duration,
    state: Mutex<FixedWindowState>,
}

impl FixedWindowLimiter {
    /// Create a limiter allowing `max_requests` per `window`
    pub fn new(max_requests: u32, window: Duration) -> Self {
        let max_requests = max_requests.max(1);
        Self {
            max_requests,
            window,
            interval: window / max_requests,
            state: Mutex::new(FixedWindowState {
                processed_in_window: 0,
                epoch: 0,
                admitted_total: 0,
                waits: 0,
            }),
        }
    }

    /// Pacing applied after each call
    pub fn interval(&self) -> Duration {
        self.interval
    }
}

#[async_trait]
impl RateLimiter for FixedWindowLimiter {
    async fn admit(&self) {
        loop {
            let observed_epoch = {
                let mut state = self.state.lock().await;
                if state.processed_in_window < self.max_requests {
                    state.processed_in_window += 1;
                    state.admitted_total += 1;
                    debug!(
                        in_window = state.processed_in_window,
                        max = self.max_requests,
                        "Admitted call"
                    );
                    return;
                }
                state.waits += 1;
                state.epoch
            };

            warn!(
                max = self.max_requests,
                window_secs = self.window.as_secs_f64(),
                "Rate limit reached, waiting for the window to reset"
            );
            sleep(self.window).await;

            let mut state = self.state.lock().await;
            if state.epoch == observed_epoch {
                state.processed_in_window = 0;
                state.epoch += 1;
            }
        }
    }

    async fn settle(&self) {
        sleep(self.interval).await;
    }

    async fn snapshot(&self) -> LimiterSnapshot {
        let state = self.state.lock().await;
        LimiterSnapshot {
            in_window: state.processed_in_window,
            admitted_total: state.admitted_total,
            window_resets: state.epoch,
            waits: state.waits,
        }
    }
}
