//! Prompt generation command

use anyhow::{Context, bail};
use scribe_core::config::load;
use scribe_core::{
    Dispatcher, EchoGenerator, GeminiGenerator, Generator, RateLimitPolicy, ScribeConfig,
    TaskFailure, TaskOutcome,
};
use serde::Serialize;
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Options for `scribe run`
#[derive(Debug, Default)]
pub struct RunOptions {
    pub prompts: Vec<String>,
    pub config_path: Option<PathBuf>,
    pub policy: Option<RateLimitPolicy>,
    pub max_requests: Option<u32>,
    pub window_secs: Option<u64>,
    pub dry_run: bool,
    pub json: bool,
}

/// One line of `--json` output
#[derive(Debug, Serialize)]
struct PromptReport<'a> {
    task_id: u64,
    prompt: &'a str,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    queued_ms: u128,
    processed_ms: u128,
}

impl<'a> PromptReport<'a> {
    fn new(prompt: &'a str, outcome: &'a TaskOutcome) -> Self {
        let (status, error) = match outcome.failure() {
            None => ("ok", None),
            Some(TaskFailure::Cancelled) => ("cancelled", None),
            Some(failure) => ("failed", Some(failure.to_string())),
        };
        Self {
            task_id: outcome.id.0,
            prompt,
            status,
            text: outcome.text(),
            error,
            queued_ms: outcome.queued_for.as_millis(),
            processed_ms: outcome.processed_in.as_millis(),
        }
    }
}

/// Generate every prompt in order; returns the process exit code
pub async fn execute(options: RunOptions) -> anyhow::Result<i32> {
    let config = build_config(&options)?;
    let prompts = if options.prompts.is_empty() {
        read_prompts(io::stdin().lock())?
    } else {
        options.prompts.clone()
    };
    if prompts.is_empty() {
        bail!("No prompts given; pass them as arguments or one per line on stdin");
    }

    let generator: Arc<dyn Generator> = if options.dry_run {
        Arc::new(EchoGenerator)
    } else {
        Arc::new(
            GeminiGenerator::new(config.gemini.clone())
                .context("Gemini is not configured; set GEMINI_API_KEY or use --dry-run")?,
        )
    };

    info!(
        prompts = prompts.len(),
        policy = %config.dispatcher.policy,
        max_requests = config.dispatcher.max_requests_per_window,
        window_secs = config.dispatcher.window.as_secs(),
        "Starting generation"
    );

    let dispatcher = Dispatcher::new(config.dispatcher.clone(), generator);
    dispatcher.start()?;

    let interrupt = {
        let dispatcher = dispatcher.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, cancelling remaining prompts");
                if let Err(e) = dispatcher.stop().await {
                    warn!(error = %e, "Dispatcher was already stopped");
                }
            }
        })
    };

    let handles = dispatcher.submit_batch(prompts.iter().cloned());
    let mut failures = 0usize;
    for (prompt, handle) in prompts.iter().zip(handles) {
        let outcome = handle.await;
        if !outcome.is_success() {
            failures += 1;
        }
        print_outcome(prompt, &outcome, options.json)?;
    }

    interrupt.abort();
    if dispatcher.is_running() {
        dispatcher.stop().await?;
    }

    let stats = dispatcher.stats();
    info!(
        completed = stats.completed,
        failed = stats.failed,
        cancelled = stats.cancelled,
        "Generation finished"
    );

    Ok(if failures == 0 { 0 } else { 1 })
}

/// Apply command-line overrides on top of file and environment settings
fn build_config(options: &RunOptions) -> anyhow::Result<ScribeConfig> {
    let mut config = load(options.config_path.as_deref())?;
    if let Some(policy) = options.policy {
        config.dispatcher.policy = policy;
    }
    if let Some(max_requests) = options.max_requests {
        config.dispatcher.max_requests_per_window = max_requests;
    }
    if let Some(window_secs) = options.window_secs {
        config.dispatcher.window = Duration::from_secs(window_secs);
    }
    config.validate()?;
    Ok(config)
}

/// Non-empty trimmed lines, one prompt each
fn read_prompts(reader: impl BufRead) -> anyhow::Result<Vec<String>> {
    let mut prompts = Vec::new();
    for line in reader.lines() {
        let line = line.context("Failed to read prompts from stdin")?;
        let line = line.trim();
        if !line.is_empty() {
            prompts.push(line.to_string());
        }
    }
    Ok(prompts)
}

fn print_outcome(prompt: &str, outcome: &TaskOutcome, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string(&PromptReport::new(prompt, outcome))?);
        return Ok(());
    }

    println!("=== {} | {} ===", outcome.id, prompt);
    match outcome.failure() {
        None => println!("{}", outcome.text().unwrap_or_default()),
        Some(TaskFailure::Cancelled) => println!("Cancelled before generation."),
        Some(failure) => println!("Generation failed ({}). Try again.", failure),
    }
    println!();
    Ok(())
}
