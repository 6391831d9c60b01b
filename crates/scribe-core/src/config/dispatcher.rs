//! Dispatcher and rate limit configuration

use crate::error::{ScribeError, ScribeResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default number of external calls allowed per window
pub const DEFAULT_MAX_REQUESTS_PER_WINDOW: u32 = 10;

/// Default admission window (one minute)
pub const DEFAULT_WINDOW_SECS: u64 = 60;

/// Default dequeue timeout used while polling for work
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;

/// Admission policy used by the dispatcher's rate limiter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateLimitPolicy {
    /// Timestamp history of the last `max` admissions checked against real time
    #[default]
    SlidingWindow,
    /// Counter that sleeps a full window once `max` is reached, then resets,
    /// and paces every call by `window / max`
    FixedWindow,
    /// No admission control
    Unlimited,
}

impl fmt::Display for RateLimitPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::SlidingWindow => "sliding_window",
            Self::FixedWindow => "fixed_window",
            Self::Unlimited => "unlimited",
        };
        f.write_str(name)
    }
}

impl FromStr for RateLimitPolicy {
    type Err = ScribeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "sliding_window" | "sliding" => Ok(Self::SlidingWindow),
            "fixed_window" | "fixed" | "legacy" => Ok(Self::FixedWindow),
            "unlimited" | "none" | "off" => Ok(Self::Unlimited),
            other => Err(ScribeError::config(format!(
                "Unknown rate limit policy '{}' (expected sliding_window, fixed_window or unlimited)",
                other
            ))),
        }
    }
}

/// Configuration for the dispatcher and its rate limiter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Upper bound on external calls per admission window
    pub max_requests_per_window: u32,
    /// Length of the admission window
    #[serde(with = "humantime_serde")]
    pub window: Duration,
    /// Admission policy
    pub policy: RateLimitPolicy,
    /// How long the worker waits on an empty queue before checking for shutdown
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            max_requests_per_window: DEFAULT_MAX_REQUESTS_PER_WINDOW,
            window: Duration::from_secs(DEFAULT_WINDOW_SECS),
            policy: RateLimitPolicy::default(),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }
}

impl DispatcherConfig {
    /// Create a config with the given limit per window
    pub fn new(max_requests_per_window: u32, window: Duration) -> Self {
        Self {
            max_requests_per_window,
            window,
            ..Default::default()
        }
    }

    /// Set the admission policy
    pub fn with_policy(mut self, policy: RateLimitPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the polling interval
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Pacing between calls under the fixed window policy: `window / max`
    pub fn inter_request_interval(&self) -> Duration {
        if self.max_requests_per_window == 0 {
            return self.window;
        }
        self.window / self.max_requests_per_window
    }

    /// Reject settings the rate limiter cannot work with
    pub fn validate(&self) -> ScribeResult<()> {
        if self.max_requests_per_window == 0 {
            return Err(ScribeError::config(
                "max_requests_per_window must be greater than zero",
            ));
        }
        if self.window.is_zero() {
            return Err(ScribeError::config("window must be greater than zero"));
        }
        if self.poll_interval.is_zero() {
            return Err(ScribeError::config("poll_interval must be greater than zero"));
        }
        Ok(())
    }
}
