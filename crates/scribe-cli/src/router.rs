//! Command routing logic for CLI

use crate::args::{Cli, Commands, resolve_config_path};
use crate::commands::{self, run::RunOptions};

/// Route CLI commands to their handlers, returning the process exit code
pub async fn route(cli: Cli) -> anyhow::Result<i32> {
    match cli.command {
        Commands::Run {
            prompts,
            config,
            policy,
            max_requests,
            window_secs,
            dry_run,
            json,
        } => {
            let options = RunOptions {
                prompts,
                config_path: resolve_config_path(config.as_ref()),
                policy,
                max_requests,
                window_secs,
                dry_run,
                json,
            };
            commands::run::execute(options).await
        }
        Commands::Config { config } => {
            commands::config::show(resolve_config_path(config.as_ref()).as_deref())?;
            Ok(0)
        }
    }
}
