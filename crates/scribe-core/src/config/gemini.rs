//! Gemini generator settings

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default Gemini model
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash-latest";

/// Default Gemini API base URL
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Settings for [`GeminiGenerator`](crate::generator::GeminiGenerator)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    /// API key; usually supplied through `GEMINI_API_KEY`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Model name
    pub model: String,
    /// Upper bound on generated tokens per call
    pub max_output_tokens: u32,
    /// API base URL
    pub base_url: String,
    /// Timeout for one HTTP request
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            max_output_tokens: 8192,
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(60),
        }
    }
}

impl GeminiConfig {
    /// Copy of this config with the API key masked, for display
    pub fn redacted(&self) -> Self {
        Self {
            api_key: self.api_key.as_ref().map(|_| "********".to_string()),
            ..self.clone()
        }
    }
}
