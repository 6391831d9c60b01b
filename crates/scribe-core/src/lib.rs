//! Scribe Core Library
//!
//! A rate-limited sequential dispatcher for prompt generation work. Callers
//! submit prompts from anywhere; a single worker drains them in order, keeps
//! the external generator under a per-window call budget, and hands each
//! caller its own result.

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod generator;
pub mod queue;
pub mod rate_limiter;
pub mod task;

// Re-export commonly used types
pub use config::{DispatcherConfig, GeminiConfig, RateLimitPolicy, ScribeConfig};
pub use dispatcher::{Dispatcher, DispatcherStats, WorkerState};
pub use error::{GenerateError, ScribeError, ScribeResult, TaskFailure};
pub use generator::{EchoGenerator, FnGenerator, GeminiGenerator, Generator};
pub use rate_limiter::{
    FixedWindowLimiter, LimiterSnapshot, RateLimiter, SlidingWindowLimiter, UnlimitedLimiter,
};
pub use task::{TaskHandle, TaskId, TaskOutcome};
