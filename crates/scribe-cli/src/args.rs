//! CLI argument definitions using clap
//!
//! - scribe run "prompt" ...    # Generate each prompt in order
//! - scribe run < prompts.txt   # One prompt per stdin line
//! - scribe config              # Print the effective configuration

use clap::{Parser, Subcommand};
use scribe_core::RateLimitPolicy;
use std::path::PathBuf;

/// Default configuration file name, used when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "scribe.toml";

#[derive(Parser, Debug)]
#[command(name = "scribe")]
#[command(about = "Scribe - rate-limited sequential prompt generation")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate prompts one at a time under the configured rate limit
    Run {
        /// Prompts to generate; read from stdin (one per line) when omitted
        prompts: Vec<String>,

        /// Path to configuration file (TOML or JSON)
        #[arg(long, short)]
        config: Option<PathBuf>,

        /// Rate limit policy: sliding_window, fixed_window or unlimited
        #[arg(long)]
        policy: Option<RateLimitPolicy>,

        /// Maximum generator calls per window
        #[arg(long)]
        max_requests: Option<u32>,

        /// Window length in seconds
        #[arg(long)]
        window_secs: Option<u64>,

        /// Echo prompts back instead of calling Gemini
        #[arg(long)]
        dry_run: bool,

        /// Print one JSON object per prompt
        #[arg(long)]
        json: bool,
    },

    /// Print the effective configuration as TOML
    Config {
        /// Path to configuration file (TOML or JSON)
        #[arg(long, short)]
        config: Option<PathBuf>,
    },
}

/// Resolve the config path, falling back to `scribe.toml` when it exists
pub fn resolve_config_path(config: Option<&PathBuf>) -> Option<PathBuf> {
    match config {
        Some(path) => Some(path.clone()),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_FILE);
            default.exists().then_some(default)
        }
    }
}
