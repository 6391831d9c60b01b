//! Configuration loading: file, then environment, then validation

use super::{RateLimitPolicy, ScribeConfig};
use crate::error::{ScribeError, ScribeResult};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Load configuration from a file
///
/// Supports TOML and JSON formats based on file extension.
/// Returns default config if the file doesn't exist.
pub fn load_from_file(path: &Path) -> ScribeResult<ScribeConfig> {
    if !path.exists() {
        return Ok(ScribeConfig::default());
    }

    let content = fs::read_to_string(path).map_err(|e| {
        ScribeError::config_with_context(
            format!("Failed to read config file: {}", e),
            format!("Reading configuration from '{}'", path.display()),
        )
    })?;

    let config = match path.extension().and_then(|s| s.to_str()) {
        Some("json") => serde_json::from_str(&content).map_err(|e| {
            ScribeError::config_with_context(
                format!("Failed to parse JSON config: {}", e),
                format!("Deserializing JSON configuration from '{}'", path.display()),
            )
        })?,
        _ => toml::from_str(&content).map_err(|e| {
            ScribeError::config_with_context(
                format!("Failed to parse TOML config: {}", e),
                format!("Deserializing TOML configuration from '{}'", path.display()),
            )
        })?,
    };

    Ok(config)
}

/// Apply `SCRIBE_*` and `GEMINI_*` overrides read through `lookup`
///
/// `lookup` returns the value of an environment variable, if set.
pub fn apply_env_overrides<F>(config: &mut ScribeConfig, lookup: F) -> ScribeResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup("SCRIBE_MAX_REQUESTS") {
        config.dispatcher.max_requests_per_window = value
            .trim()
            .parse()
            .map_err(|_| ScribeError::config(format!("Invalid SCRIBE_MAX_REQUESTS value: {}", value)))?;
    }

    if let Some(value) = lookup("SCRIBE_WINDOW_SECS") {
        let secs: u64 = value
            .trim()
            .parse()
            .map_err(|_| ScribeError::config(format!("Invalid SCRIBE_WINDOW_SECS value: {}", value)))?;
        config.dispatcher.window = Duration::from_secs(secs);
    }

    if let Some(value) = lookup("SCRIBE_POLICY") {
        config.dispatcher.policy = value.parse::<RateLimitPolicy>()?;
    }

    if let Some(value) = lookup("SCRIBE_POLL_INTERVAL_MS") {
        let millis: u64 = value.trim().parse().map_err(|_| {
            ScribeError::config(format!("Invalid SCRIBE_POLL_INTERVAL_MS value: {}", value))
        })?;
        config.dispatcher.poll_interval = Duration::from_millis(millis);
    }

    if let Some(api_key) = lookup("GEMINI_API_KEY") {
        if !api_key.trim().is_empty() {
            config.gemini.api_key = Some(api_key);
        }
    }

    if let Some(model) = lookup("GEMINI_MODEL") {
        config.gemini.model = model;
    }

    Ok(())
}

/// Load configuration: file (if present), environment overrides, validation
pub fn load(path: Option<&Path>) -> ScribeResult<ScribeConfig> {
    let mut config = match path {
        Some(path) => load_from_file(path)?,
        None => ScribeConfig::default(),
    };
    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = load_from_file(&temp_dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, ScribeConfig::default());
    }

    #[test]
    fn test_load_from_toml_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("scribe.toml");
        fs::write(
            &path,
            r#"
[dispatcher]
max_requests_per_window = 5
window = "30s"
policy = "fixed_window"

[gemini]
model = "gemini-pro"
"#,
        )
        .unwrap();

        let config = load_from_file(&path).unwrap();
        assert_eq!(config.dispatcher.max_requests_per_window, 5);
        assert_eq!(config.dispatcher.window, Duration::from_secs(30));
        assert_eq!(config.dispatcher.policy, RateLimitPolicy::FixedWindow);
        assert_eq!(config.dispatcher.poll_interval, Duration::from_secs(1));
        assert_eq!(config.gemini.model, "gemini-pro");
        assert_eq!(config.gemini.max_output_tokens, 8192);
    }

    #[test]
    fn test_load_from_json_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("scribe.json");
        fs::write(
            &path,
            r#"{"dispatcher": {"max_requests_per_window": 20, "poll_interval": "250ms"}}"#,
        )
        .unwrap();

        let config = load_from_file(&path).unwrap();
        assert_eq!(config.dispatcher.max_requests_per_window, 20);
        assert_eq!(config.dispatcher.poll_interval, Duration::from_millis(250));
        assert_eq!(config.dispatcher.window, Duration::from_secs(60));
    }

    #[test]
    fn test_invalid_file_reports_context() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.toml");
        fs::write(&path, "dispatcher = [").unwrap();

        let err = load_from_file(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse TOML config"));
        assert!(err.context().unwrap().contains("broken.toml"));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = ScribeConfig::default();
        apply_env_overrides(
            &mut config,
            env(&[
                ("SCRIBE_MAX_REQUESTS", "3"),
                ("SCRIBE_WINDOW_SECS", "12"),
                ("SCRIBE_POLICY", "fixed"),
                ("SCRIBE_POLL_INTERVAL_MS", "50"),
                ("GEMINI_API_KEY", "secret"),
                ("GEMINI_MODEL", "gemini-2.0-flash"),
            ]),
        )
        .unwrap();

        assert_eq!(config.dispatcher.max_requests_per_window, 3);
        assert_eq!(config.dispatcher.window, Duration::from_secs(12));
        assert_eq!(config.dispatcher.policy, RateLimitPolicy::FixedWindow);
        assert_eq!(config.dispatcher.poll_interval, Duration::from_millis(50));
        assert_eq!(config.dispatcher.inter_request_interval(), Duration::from_secs(4));
        assert_eq!(config.gemini.api_key.as_deref(), Some("secret"));
        assert_eq!(config.gemini.model, "gemini-2.0-flash");
    }

    #[test]
    fn test_invalid_env_value() {
        let mut config = ScribeConfig::default();
        let err = apply_env_overrides(&mut config, env(&[("SCRIBE_MAX_REQUESTS", "ten")]))
            .unwrap_err();
        assert!(err.to_string().contains("SCRIBE_MAX_REQUESTS"));
    }

    #[test]
    fn test_blank_api_key_is_ignored() {
        let mut config = ScribeConfig::default();
        apply_env_overrides(&mut config, env(&[("GEMINI_API_KEY", "  ")])).unwrap();
        assert!(config.gemini.api_key.is_none());
    }
}
