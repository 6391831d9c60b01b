//! Sliding window limiter for accurate per-window bounds

use super::{LimiterSnapshot, RateLimiter};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep};
use tracing::debug;

#[derive(Debug)]
struct SlidingWindowState {
    /// Admission times, oldest first; never longer than `max_requests`
    timestamps: VecDeque<Instant>,
    admitted_total: u64,
    waits: u64,
}

impl SlidingWindowState {
    fn prune(&mut self, now: Instant, window: Duration) {
        while let Some(front) = self.timestamps.front() {
            if now.duration_since(*front) >= window {
                self.timestamps.pop_front();
            } else {
                break;
            }
        }
    }
}

/// Limiter that checks the last `max_requests` admissions against real time
#[derive(Debug)]
pub struct SlidingWindowLimiter {
    max_requests: u32,
    window: Duration,
    state: Mutex<SlidingWindowState>,
}

impl SlidingWindowLimiter {
    /// Create a limiter allowing `max_requests` in any `window`
    pub fn new(max_requests: u32, window: Duration) -> Self {
        let max_requests = max_requests.max(1);
        Self {
            max_requests,
            window,
            state: Mutex::new(SlidingWindowState {
                timestamps: VecDeque::with_capacity(max_requests as usize),
                admitted_total: 0,
                waits: 0,
            }),
        }
    }

    /// Create with requests per minute
    pub fn per_minute(requests: u32) -> Self {
        Self::new(requests, Duration::from_secs(60))
    }
}

#[async_trait]
impl RateLimiter for SlidingWindowLimiter {
    async fn admit(&self) {
        loop {
            let wait = {
                let mut state = self.state.lock().await;
                let now = Instant::now();
                state.prune(now, self.window);

                if state.timestamps.len() < self.max_requests as usize {
                    state.timestamps.push_back(now);
                    state.admitted_total += 1;
                    return;
                }

                state.waits += 1;
                match state.timestamps.front() {
                    Some(oldest) => self.window.saturating_sub(now.duration_since(*oldest)),
                    None => Duration::ZERO,
                }
            };

            debug!(
                wait_ms = wait.as_millis() as u64,
                max = self.max_requests,
                "Window full, waiting for the oldest call to expire"
            );
            sleep(wait).await;
        }
    }

    async fn snapshot(&self) -> LimiterSnapshot {
        let mut state = self.state.lock().await;
        state.prune(Instant::now(), self.window);
        LimiterSnapshot {
            in_window: state.timestamps.len() as u32,
            admitted_total: state.admitted_total,
            window_resets: 0,
            waits: state.waits,
        }
    }
}
