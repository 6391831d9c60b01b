//! Scribe CLI application
//!
//! Feeds prompts through a rate-limited dispatcher and prints each result in
//! submission order.
//!
//! ```bash
//! scribe run "Introduction" "Body" "Conclusion"
//! scribe run --dry-run --policy fixed --max-requests 2 < sections.txt
//! scribe config
//! ```
//!
//! Logs go to stderr; set `RUST_LOG=debug` for per-task detail.

mod args;
mod commands;
mod router;

use args::Cli;
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let code = router::route(cli).await?;
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}
