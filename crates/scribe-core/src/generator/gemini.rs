//! Google Gemini generator

use super::Generator;
use crate::config::GeminiConfig;
use crate::error::{GenerateError, ScribeError, ScribeResult};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use tracing::instrument;

/// Header carrying the API key; keeps the key out of request URLs and errors
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Single `generateContent` call per prompt
#[derive(Debug, Clone)]
pub struct GeminiGenerator {
    config: GeminiConfig,
    api_key: String,
    http_client: Client,
}

impl GeminiGenerator {
    /// Create a generator; fails when no API key is configured
    pub fn new(config: GeminiConfig) -> ScribeResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                ScribeError::config_with_context(
                    "Gemini API key not provided",
                    "Set GEMINI_API_KEY or gemini.api_key in the config file",
                )
            })?;

        let http_client = Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            config,
            api_key,
            http_client,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    fn request_body(&self, prompt: &str) -> Value {
        json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": prompt }]
            }],
            "generationConfig": {
                "maxOutputTokens": self.config.max_output_tokens
            }
        })
    }
}

/// Map a non-success status to the error class the dispatcher reports
fn classify_status(status: StatusCode, body: &str) -> GenerateError {
    let message = format!("Gemini API error (status {}): {}", status, body);
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        GenerateError::transient(message)
    } else {
        GenerateError::rejected(message)
    }
}

/// Concatenate the text parts of the first candidate
fn extract_text(response: &Value) -> Result<String, GenerateError> {
    let parts = response
        .pointer("/candidates/0/content/parts")
        .and_then(Value::as_array)
        .ok_or_else(|| GenerateError::rejected("Gemini response contained no candidates"))?;

    let text: String = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect();

    if text.is_empty() {
        return Err(GenerateError::rejected("Gemini response contained no text"));
    }
    Ok(text)
}

#[async_trait]
impl Generator for GeminiGenerator {
    #[instrument(skip(self, prompt), fields(model = %self.config.model), level = "debug")]
    async fn generate(&self, prompt: &str) -> Result<String, GenerateError> {
        let response = self
            .http_client
            .post(self.endpoint())
            .header(API_KEY_HEADER, self.api_key.as_str())
            .json(&self.request_body(prompt))
            .send()
            .await
            .map_err(|e| {
                GenerateError::transient(format!("Gemini request failed: {}", e.without_url()))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &error_text));
        }

        let response_json: Value = response
            .json()
            .await
            .map_err(|e| {
                GenerateError::rejected(format!(
                    "Failed to parse Gemini response: {}",
                    e.without_url()
                ))
            })?;

        extract_text(&response_json)
    }
}
