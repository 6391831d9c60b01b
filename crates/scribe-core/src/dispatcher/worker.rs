//! The single background worker draining the queue

use super::state::{Shared, WorkerState};
use crate::error::TaskFailure;
use crate::generator::Generator;
use crate::queue::{Dequeue, TaskReceiver};
use crate::rate_limiter::RateLimiter;
use crate::task::{Task, TaskOutcome};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

pub(crate) struct Worker {
    pub(crate) receiver: TaskReceiver<Task>,
    pub(crate) generator: Arc<dyn Generator>,
    pub(crate) limiter: Arc<dyn RateLimiter>,
    pub(crate) shared: Arc<Shared>,
    pub(crate) cancel_token: CancellationToken,
    pub(crate) poll_interval: Duration,
}

impl Worker {
    pub(crate) async fn run(mut self) {
        info!(poll_interval_ms = self.poll_interval.as_millis() as u64, "Dispatcher started");

        loop {
            if self.cancel_token.is_cancelled() {
                break;
            }

            self.shared.set_state(WorkerState::Polling);
            let task = tokio::select! {
                _ = self.cancel_token.cancelled() => break,
                next = self.receiver.dequeue_timeout(self.poll_interval) => match next {
                    Dequeue::Item(task) => task,
                    Dequeue::TimedOut => continue,
                    Dequeue::Closed => {
                        debug!("All submitters dropped, worker exiting");
                        break;
                    }
                },
            };

            self.handle(task).await;
        }

        info!("Dispatcher stopped");
    }

    async fn handle(&self, task: Task) {
        let _outstanding = Outstanding(&self.shared);
        // Declared after the guard so an unpublished slot drops before release.
        let task = task;
        let picked_up_at = Instant::now();
        let queued_for = picked_up_at.duration_since(task.submitted_at);

        self.shared.set_state(WorkerState::RateGate);
        let admitted = tokio::select! {
            _ = self.cancel_token.cancelled() => false,
            _ = self.limiter.admit() => true,
        };
        if !admitted {
            debug!(task_id = %task.id, "Stopped while waiting for admission");
            self.shared.record_cancelled();
            task.cancel();
            return;
        }

        self.shared.set_state(WorkerState::Processing);
        let result = match AssertUnwindSafe(self.generator.generate(&task.prompt))
            .catch_unwind()
            .await
        {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => {
                warn!(task_id = %task.id, error = %e, "Generation failed");
                Err(TaskFailure::from(e))
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!(task_id = %task.id, panic = %message, "Generator panicked");
                Err(TaskFailure::Panicked { message })
            }
        };

        // Pacing is skipped when stopping; the result is published either way.
        self.shared.set_state(WorkerState::RateGate);
        tokio::select! {
            _ = self.cancel_token.cancelled() => {}
            _ = self.limiter.settle() => {}
        }

        self.shared.set_state(WorkerState::Publishing);
        self.shared.record_completed(result.is_ok());
        let outcome = TaskOutcome {
            id: task.id,
            result,
            queued_for,
            processed_in: picked_up_at.elapsed(),
        };
        if !task.slot.publish(outcome) {
            debug!(task_id = %task.id, "Submitter stopped waiting, result dropped");
        }
    }

    /// Refuse new work and cancel everything still queued
    fn drain(&mut self) {
        self.receiver.close();
        let mut cancelled = 0usize;
        while let Some(task) = self.receiver.try_dequeue() {
            self.shared.record_cancelled();
            task.cancel();
            self.shared.release();
            cancelled += 1;
        }
        if cancelled > 0 {
            warn!(count = cancelled, "Cancelled queued tasks at shutdown");
        }
    }
}

// Runs when `run` returns and when the worker task unwinds.
impl Drop for Worker {
    fn drop(&mut self) {
        self.drain();
        self.shared.set_state(WorkerState::Stopped);
    }
}

/// Releases one dequeued task from the outstanding count once it is dropped
struct Outstanding<'a>(&'a Shared);

impl Drop for Outstanding<'_> {
    fn drop(&mut self) {
        self.0.release();
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
