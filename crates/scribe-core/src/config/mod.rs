//! Configuration for Scribe
//!
//! Settings come from an optional TOML/JSON file, then `SCRIBE_*` and
//! `GEMINI_*` environment variables, then validation.

mod dispatcher;
mod gemini;
pub mod loader;

pub use dispatcher::{
    DEFAULT_MAX_REQUESTS_PER_WINDOW, DEFAULT_POLL_INTERVAL_MS, DEFAULT_WINDOW_SECS,
    DispatcherConfig, RateLimitPolicy,
};
pub use gemini::GeminiConfig;
pub use loader::{apply_env_overrides, load, load_from_file};

use crate::error::ScribeResult;
use serde::{Deserialize, Serialize};

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScribeConfig {
    /// Dispatcher and rate limiter settings
    pub dispatcher: DispatcherConfig,
    /// Gemini generator settings
    pub gemini: GeminiConfig,
}

impl ScribeConfig {
    /// Validate every section
    pub fn validate(&self) -> ScribeResult<()> {
        self.dispatcher.validate()
    }
}
