//! Integration tests for Scribe core functionality
//!
//! Drives the dispatcher through the public API: config, generator, limiter
//! and per-task completion together.

use async_trait::async_trait;
use scribe_core::{
    Dispatcher, GenerateError, Generator, RateLimitPolicy, ScribeConfig, ScribeResult,
    TaskFailure, WorkerState, config::loader,
};
use std::fs;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tempfile::TempDir;

/// Route dispatcher logs to the test harness; set RUST_LOG to see them
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Generator that fails every `fail_every`-th call
struct FlakyGenerator {
    calls: AtomicU32,
    fail_every: u32,
}

#[async_trait]
impl Generator for FlakyGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerateError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call % self.fail_every == 0 {
            return Err(GenerateError::exhausted(6, format!("call {} failed", call)));
        }
        Ok(format!("## {}\n\nGenerated section.", prompt))
    }
}

/// Blog sections generated one after another through a config-built dispatcher
#[tokio::test(start_paused = true)]
async fn test_blog_sections_from_config_file() -> ScribeResult<()> {
    init_tracing();
    let temp_dir = TempDir::new().expect("temp dir");
    let path = temp_dir.path().join("scribe.toml");
    fs::write(
        &path,
        r#"
[dispatcher]
max_requests_per_window = 2
window = "10s"
policy = "fixed_window"
poll_interval = "100ms"
"#,
    )
    .expect("write config");

    let config: ScribeConfig = loader::load_from_file(&path)?;
    config.validate()?;
    assert_eq!(config.dispatcher.policy, RateLimitPolicy::FixedWindow);

    let generator = Arc::new(FlakyGenerator {
        calls: AtomicU32::new(0),
        fail_every: 3,
    });
    let dispatcher = Dispatcher::new(config.dispatcher, generator);
    dispatcher.start()?;

    let sections = ["Introduction", "Body", "FAQs", "Conclusion"];
    let handles = dispatcher.submit_batch(sections);
    let mut outcomes = Vec::new();
    for handle in handles {
        outcomes.push(handle.await);
    }

    assert!(outcomes[0].text().unwrap().starts_with("## Introduction"));
    assert!(outcomes[1].is_success());
    assert!(matches!(
        outcomes[2].failure(),
        Some(TaskFailure::Generation(GenerateError::ExhaustedRetries { attempts: 6, .. }))
    ));
    assert!(outcomes[3].text().unwrap().starts_with("## Conclusion"));

    let stats = dispatcher.stats();
    assert_eq!(stats.submitted, 4);
    assert_eq!(stats.completed, 4);
    assert_eq!(stats.failed, 1);
    assert_eq!(dispatcher.limiter_snapshot().await.window_resets, 1);

    dispatcher.stop().await?;
    assert_eq!(dispatcher.state(), WorkerState::Stopped);
    Ok(())
}

/// Two independent callers share one dispatcher without waiting on each other's work
#[tokio::test]
async fn test_independent_callers_share_dispatcher() -> ScribeResult<()> {
    init_tracing();
    let mut config = ScribeConfig::default();
    config.dispatcher.policy = RateLimitPolicy::Unlimited;
    config.dispatcher.poll_interval = Duration::from_millis(10);

    let generator = Arc::new(FlakyGenerator {
        calls: AtomicU32::new(0),
        fail_every: u32::MAX,
    });
    let dispatcher = Dispatcher::new(config.dispatcher, generator);
    dispatcher.start()?;

    let first = {
        let dispatcher = dispatcher.clone();
        tokio::spawn(async move { dispatcher.submit_and_wait("first caller").await })
    };
    let second = {
        let dispatcher = dispatcher.clone();
        tokio::spawn(async move { dispatcher.submit_and_wait("second caller").await })
    };

    let first = first.await.expect("first caller");
    let second = second.await.expect("second caller");
    assert!(first.text().unwrap().contains("first caller"));
    assert!(second.text().unwrap().contains("second caller"));
    assert_ne!(first.id, second.id);

    dispatcher.wait_idle().await;
    dispatcher.stop().await?;
    Ok(())
}
