//! Configuration display command

use anyhow::Context;
use scribe_core::ScribeConfig;
use scribe_core::config::load;
use std::path::Path;

/// Print the effective configuration (file, then environment) as TOML
pub fn show(config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = load(config_path)?;
    match config_path {
        Some(path) => eprintln!("# Loaded from {}", path.display()),
        None => eprintln!("# No config file, using defaults and environment"),
    }
    print!("{}", render(&config)?);
    Ok(())
}

/// Render config as TOML with the API key masked
pub fn render(config: &ScribeConfig) -> anyhow::Result<String> {
    let redacted = ScribeConfig {
        dispatcher: config.dispatcher.clone(),
        gemini: config.gemini.redacted(),
    };
    toml::to_string_pretty(&redacted).context("Failed to render configuration as TOML")
}
