//! Tasks, their write-once result slots, and the handles callers wait on

use crate::error::TaskFailure;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::Instant;

/// Submission sequence number; increases with every submitted task
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(pub u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task-{}", self.0)
    }
}

/// What a task produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskOutcome {
    pub id: TaskId,
    /// Generated text, or the failure marker
    pub result: Result<String, TaskFailure>,
    /// Time between submission and the worker picking the task up
    pub queued_for: Duration,
    /// Time between pickup and publication, including rate limiting
    pub processed_in: Duration,
}

impl TaskOutcome {
    pub(crate) fn cancelled(id: TaskId, queued_for: Duration) -> Self {
        Self {
            id,
            result: Err(TaskFailure::Cancelled),
            queued_for,
            processed_in: Duration::ZERO,
        }
    }

    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// Generated text, if the task succeeded
    pub fn text(&self) -> Option<&str> {
        self.result.as_deref().ok()
    }

    /// Failure marker, if the task failed
    pub fn failure(&self) -> Option<&TaskFailure> {
        self.result.as_ref().err()
    }

    pub fn into_result(self) -> Result<String, TaskFailure> {
        self.result
    }
}

/// Write-once slot for a task's outcome.
///
/// Publishing consumes the slot, which also fires the completion signal.
#[derive(Debug)]
pub struct ResultSlot {
    tx: oneshot::Sender<TaskOutcome>,
}

impl ResultSlot {
    /// Write the outcome and wake the waiter.
    ///
    /// Returns `false` if the caller stopped waiting.
    pub fn publish(self, outcome: TaskOutcome) -> bool {
        self.tx.send(outcome).is_ok()
    }

    /// Whether anyone is still waiting on this slot
    pub fn is_awaited(&self) -> bool {
        !self.tx.is_closed()
    }
}

/// One unit of work
#[derive(Debug)]
pub struct Task {
    pub id: TaskId,
    pub prompt: String,
    pub submitted_at: Instant,
    pub slot: ResultSlot,
}

impl Task {
    /// Create a task and the handle its submitter waits on
    pub fn new(id: TaskId, prompt: impl Into<String>) -> (Self, TaskHandle) {
        let (tx, rx) = oneshot::channel();
        let task = Self {
            id,
            prompt: prompt.into(),
            submitted_at: Instant::now(),
            slot: ResultSlot { tx },
        };
        (task, TaskHandle { id, rx })
    }

    /// Publish a cancellation marker without processing the prompt
    pub fn cancel(self) -> bool {
        let outcome = TaskOutcome::cancelled(self.id, self.submitted_at.elapsed());
        self.slot.publish(outcome)
    }
}

/// Caller-side view of one submitted task
///
/// Awaiting the handle (or calling [`TaskHandle::wait`]) resolves once this
/// task, and only this task, has been published.
#[derive(Debug)]
pub struct TaskHandle {
    id: TaskId,
    rx: oneshot::Receiver<TaskOutcome>,
}

impl TaskHandle {
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Block until this task's outcome is published
    pub async fn wait(self) -> TaskOutcome {
        self.await
    }

    /// Take the outcome if it has already been published.
    ///
    /// Consumes the handle on success, so an outcome is observed once. While
    /// the task is still pending the handle is given back.
    pub fn try_outcome(mut self) -> Result<TaskOutcome, Self> {
        match self.rx.try_recv() {
            Ok(outcome) => Ok(outcome),
            Err(oneshot::error::TryRecvError::Empty) => Err(self),
            Err(oneshot::error::TryRecvError::Closed) => {
                Ok(TaskOutcome::cancelled(self.id, Duration::ZERO))
            }
        }
    }
}

impl Future for TaskHandle {
    type Output = TaskOutcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let id = self.id;
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
            // Slot dropped unpublished: the task will never run.
            Poll::Ready(Err(_)) => Poll::Ready(TaskOutcome::cancelled(id, Duration::ZERO)),
            Poll::Pending => Poll::Pending,
        }
    }
}
