//! Error types for Scribe
//!
//! Three layers of failure exist:
//! - [`GenerateError`]: what a [`Generator`](crate::generator::Generator) reports
//! - [`TaskFailure`]: the failure marker published into a task's result slot
//! - [`ScribeError`]: errors returned by the library API itself (config, lifecycle)
//!
//! Rate limiter backpressure is never an error; it only shows up as latency.

use thiserror::Error;

/// Result type alias for Scribe operations
pub type ScribeResult<T> = Result<T, ScribeError>;

/// Failure reported by a generator for a single prompt
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerateError {
    /// Upstream failure that may succeed if attempted again
    #[error("Transient generation error: {message}")]
    Transient { message: String },

    /// The generator's own retry policy gave up
    #[error("Generation failed after {attempts} attempts: {last_error}")]
    ExhaustedRetries { attempts: u32, last_error: String },

    /// Upstream refused the request; retrying will not help
    #[error("Generation rejected: {message}")]
    Rejected { message: String },
}

impl GenerateError {
    /// Create a transient error
    pub fn transient(message: impl Into<String>) -> Self {
        Self::Transient {
            message: message.into(),
        }
    }

    /// Create an exhausted-retries error
    pub fn exhausted(attempts: u32, last_error: impl Into<String>) -> Self {
        Self::ExhaustedRetries {
            attempts,
            last_error: last_error.into(),
        }
    }

    /// Create a permanent rejection
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }

    /// Whether the failure class is worth retrying at the generator level.
    ///
    /// The dispatcher never retries; this is for generator implementations.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }
}

/// Failure marker written into a task's result slot
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskFailure {
    /// The generator returned an error
    #[error(transparent)]
    Generation(#[from] GenerateError),

    /// The generator panicked while handling this task
    #[error("Generator panicked: {message}")]
    Panicked { message: String },

    /// The dispatcher stopped before this task was processed
    #[error("Task was cancelled before processing")]
    Cancelled,
}

/// Main error type for the Scribe library
#[derive(Error, Debug, Clone)]
pub enum ScribeError {
    /// Configuration related errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        context: Option<String>,
    },

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(String),

    /// `start` was called on a running dispatcher
    #[error("Dispatcher is already running")]
    AlreadyRunning,

    /// `stop` was called on a dispatcher that is not running
    #[error("Dispatcher is not running")]
    NotRunning,

    /// `start` was called after `stop`; a stopped dispatcher cannot restart
    #[error("Dispatcher has been stopped")]
    Stopped,

    /// `start` was called outside a tokio runtime
    #[error("Dispatcher must be started inside a tokio runtime")]
    NoRuntime,
}

impl ScribeError {
    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            context: None,
        }
    }

    /// Create a configuration error with context about where it happened
    pub fn config_with_context(message: impl Into<String>, context: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            context: Some(context.into()),
        }
    }

    /// Context attached to the error, if any
    pub fn context(&self) -> Option<&str> {
        match self {
            Self::Config { context, .. } => context.as_deref(),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ScribeError {
    fn from(error: reqwest::Error) -> Self {
        Self::Http(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_error_retryable() {
        assert!(GenerateError::transient("503").is_retryable());
        assert!(!GenerateError::rejected("401 unauthorized").is_retryable());
        assert!(!GenerateError::exhausted(6, "timeout").is_retryable());
    }

    #[test]
    fn test_task_failure_display() {
        let failure = TaskFailure::from(GenerateError::exhausted(6, "overloaded"));
        assert_eq!(
            failure.to_string(),
            "Generation failed after 6 attempts: overloaded"
        );
        assert_eq!(
            TaskFailure::Cancelled.to_string(),
            "Task was cancelled before processing"
        );
    }

    #[test]
    fn test_config_error_context() {
        let err = ScribeError::config_with_context("bad window", "reading scribe.toml");
        assert_eq!(err.to_string(), "Configuration error: bad window");
        assert_eq!(err.context(), Some("reading scribe.toml"));
        assert_eq!(ScribeError::config("x").context(), None);
    }
}
