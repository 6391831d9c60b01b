//! Rate-limited sequential dispatcher
//!
//! A [`Dispatcher`] owns one queue and one background worker. Any number of
//! callers submit prompts; the worker takes them in submission order, waits
//! for the rate limiter, calls the generator once, and publishes the outcome
//! into the task's own slot.
//!
//! # Example
//!
//! ```no_run
//! use scribe_core::config::DispatcherConfig;
//! use scribe_core::dispatcher::Dispatcher;
//! use scribe_core::generator::EchoGenerator;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let dispatcher = Dispatcher::new(DispatcherConfig::default(), Arc::new(EchoGenerator));
//!     dispatcher.start()?;
//!
//!     let outcome = dispatcher.submit_and_wait("Write the introduction").await;
//!     println!("{:?}", outcome.text());
//!
//!     dispatcher.stop().await?;
//!     Ok(())
//! }
//! ```

mod state;
mod worker;


pub use state::{DispatcherStats, WorkerState};

use crate::config::DispatcherConfig;
use crate::error::{ScribeError, ScribeResult};
use crate::generator::Generator;
use crate::queue::{TaskQueue, TaskReceiver, task_queue};
use crate::rate_limiter::{LimiterSnapshot, RateLimiter, build_limiter};
use crate::task::{Task, TaskHandle, TaskId, TaskOutcome};
use parking_lot::Mutex;
use state::Shared;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use worker::Worker;

enum Lifecycle {
    NotStarted(TaskReceiver<Task>),
    Running {
        cancel_token: CancellationToken,
        join_handle: JoinHandle<()>,
    },
    Stopping,
    Stopped,
}

struct Inner {
    config: DispatcherConfig,
    generator: Arc<dyn Generator>,
    limiter: Arc<dyn RateLimiter>,
    queue: TaskQueue<Task>,
    /// Held across id assignment and enqueue so ids follow queue order
    next_id: Mutex<u64>,
    shared: Arc<Shared>,
    lifecycle: Mutex<Lifecycle>,
}

/// Handle to a dispatcher; clones share the same queue and worker
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("config", &self.inner.config)
            .field("state", &self.state())
            .field("queue_depth", &self.queue_depth())
            .finish()
    }
}

impl Dispatcher {
    /// Create a dispatcher whose limiter follows `config.policy`
    pub fn new(config: DispatcherConfig, generator: Arc<dyn Generator>) -> Self {
        let limiter = build_limiter(&config);
        Self::with_limiter(config, generator, limiter)
    }

    /// Create a dispatcher with an explicit limiter
    pub fn with_limiter(
        config: DispatcherConfig,
        generator: Arc<dyn Generator>,
        limiter: Arc<dyn RateLimiter>,
    ) -> Self {
        let (queue, receiver) = task_queue();
        Self {
            inner: Arc::new(Inner {
                config,
                generator,
                limiter,
                queue,
                next_id: Mutex::new(1),
                shared: Arc::new(Shared::new()),
                lifecycle: Mutex::new(Lifecycle::NotStarted(receiver)),
            }),
        }
    }

    /// Spawn the worker on the current tokio runtime.
    ///
    /// Outside a runtime this returns `ScribeError::NoRuntime` and leaves the
    /// dispatcher startable.
    pub fn start(&self) -> ScribeResult<()> {
        let runtime = Handle::try_current().map_err(|_| ScribeError::NoRuntime)?;
        let mut lifecycle = self.inner.lifecycle.lock();
        let receiver = match std::mem::replace(&mut *lifecycle, Lifecycle::Stopping) {
            Lifecycle::NotStarted(receiver) => receiver,
            other => {
                let err = match other {
                    Lifecycle::Running { .. } => ScribeError::AlreadyRunning,
                    _ => ScribeError::Stopped,
                };
                *lifecycle = other;
                return Err(err);
            }
        };

        let cancel_token = CancellationToken::new();
        let worker = Worker {
            receiver,
            generator: Arc::clone(&self.inner.generator),
            limiter: Arc::clone(&self.inner.limiter),
            shared: Arc::clone(&self.inner.shared),
            cancel_token: cancel_token.clone(),
            poll_interval: self.inner.config.poll_interval,
        };
        let join_handle = runtime.spawn(worker.run());

        *lifecycle = Lifecycle::Running {
            cancel_token,
            join_handle,
        };
        Ok(())
    }

    /// Stop the worker.
    ///
    /// The task being processed finishes; tasks still queued, or waiting for
    /// admission, are published as cancelled. A stopped dispatcher cannot be
    /// restarted.
    pub async fn stop(&self) -> ScribeResult<()> {
        let (cancel_token, join_handle) = {
            let mut lifecycle = self.inner.lifecycle.lock();
            match std::mem::replace(&mut *lifecycle, Lifecycle::Stopping) {
                Lifecycle::Running {
                    cancel_token,
                    join_handle,
                } => (cancel_token, join_handle),
                other => {
                    *lifecycle = other;
                    return Err(ScribeError::NotRunning);
                }
            }
        };

        info!(queue_depth = self.queue_depth(), "Stopping dispatcher");
        cancel_token.cancel();
        if let Err(e) = join_handle.await {
            tracing::error!(error = %e, "Dispatcher worker ended abnormally");
        }

        *self.inner.lifecycle.lock() = Lifecycle::Stopped;
        Ok(())
    }

    /// Whether the worker has been started and not stopped
    pub fn is_running(&self) -> bool {
        matches!(*self.inner.lifecycle.lock(), Lifecycle::Running { .. })
    }

    /// Queue a prompt without blocking.
    ///
    /// Tasks submitted before `start` wait in the queue. Tasks submitted after
    /// `stop` resolve immediately as cancelled.
    pub fn submit(&self, prompt: impl Into<String>) -> TaskHandle {
        let prompt = prompt.into();
        let (handle, rejected) = {
            let mut next_id = self.inner.next_id.lock();
            let id = TaskId(*next_id);
            *next_id += 1;

            let (task, handle) = Task::new(id, prompt);
            self.inner.shared.record_submitted();
            (handle, self.inner.queue.enqueue(task).err())
        };

        match rejected {
            None => {
                debug!(task_id = %handle.id(), queue_depth = self.queue_depth(), "Task enqueued");
            }
            Some(task) => {
                debug!(task_id = %task.id, "Dispatcher stopped, cancelling task");
                self.inner.shared.record_cancelled();
                task.cancel();
                self.inner.shared.release();
            }
        }
        handle
    }

    /// Queue several prompts; handles are returned in submission order
    pub fn submit_batch<I, S>(&self, prompts: I) -> Vec<TaskHandle>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        prompts.into_iter().map(|prompt| self.submit(prompt)).collect()
    }

    /// Queue a prompt and wait for its outcome only
    pub async fn submit_and_wait(&self, prompt: impl Into<String>) -> TaskOutcome {
        self.submit(prompt).wait().await
    }

    /// Wait until every task submitted so far, by any caller, is published.
    ///
    /// Never resolves while tasks are queued on a dispatcher that was not started.
    pub async fn wait_idle(&self) {
        self.inner.shared.wait_idle().await;
    }

    /// Current worker state
    pub fn state(&self) -> WorkerState {
        self.inner.shared.state()
    }

    /// Watch worker state changes
    pub fn subscribe_state(&self) -> watch::Receiver<WorkerState> {
        self.inner.shared.subscribe_state()
    }

    /// Dispatcher counters
    pub fn stats(&self) -> DispatcherStats {
        self.inner.shared.stats()
    }

    /// Rate limiter counters
    pub async fn limiter_snapshot(&self) -> LimiterSnapshot {
        self.inner.limiter.snapshot().await
    }

    /// Tasks waiting in the queue (not counting the one in flight)
    pub fn queue_depth(&self) -> usize {
        self.inner.queue.len()
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.inner.config
    }
}
