//! Worker state and counters shared between the dispatcher handle and its worker

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;

/// Where the worker currently is in its loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Constructed, not started
    Idle,
    /// Waiting on the queue
    Polling,
    /// Waiting on the rate limiter, before the call or while pacing after it
    RateGate,
    /// Calling the generator
    Processing,
    /// Writing the outcome into the task's slot
    Publishing,
    /// Worker has exited
    Stopped,
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Polling => "polling",
            Self::RateGate => "rate_gate",
            Self::Processing => "processing",
            Self::Publishing => "publishing",
            Self::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Point-in-time dispatcher counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatcherStats {
    /// Tasks accepted by `submit`
    pub submitted: u64,
    /// Tasks the worker processed, successfully or not
    pub completed: u64,
    /// Processed tasks that ended with a failure marker
    pub failed: u64,
    /// Tasks that never reached the generator
    pub cancelled: u64,
    /// Tasks submitted but not yet published
    pub pending: usize,
}

/// State shared by every dispatcher clone and the worker
#[derive(Debug)]
pub(crate) struct Shared {
    submitted: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
    cancelled: AtomicU64,
    state: watch::Sender<WorkerState>,
    outstanding: watch::Sender<usize>,
}

impl Shared {
    pub(crate) fn new() -> Self {
        Self {
            submitted: AtomicU64::new(0),
            completed: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            cancelled: AtomicU64::new(0),
            state: watch::Sender::new(WorkerState::Idle),
            outstanding: watch::Sender::new(0),
        }
    }

    pub(crate) fn set_state(&self, state: WorkerState) {
        self.state.send_replace(state);
    }

    pub(crate) fn state(&self) -> WorkerState {
        *self.state.borrow()
    }

    pub(crate) fn subscribe_state(&self) -> watch::Receiver<WorkerState> {
        self.state.subscribe()
    }

    pub(crate) fn record_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::SeqCst);
        self.outstanding.send_modify(|n| *n += 1);
    }

    pub(crate) fn record_completed(&self, success: bool) {
        self.completed.fetch_add(1, Ordering::SeqCst);
        if !success {
            self.failed.fetch_add(1, Ordering::SeqCst);
        }
    }

    pub(crate) fn record_cancelled(&self) {
        self.cancelled.fetch_add(1, Ordering::SeqCst);
    }

    /// Mark one submitted task as published; call after its slot is written
    pub(crate) fn release(&self) {
        self.outstanding.send_modify(|n| *n = n.saturating_sub(1));
    }

    /// Resolves once no submitted task is left unpublished
    pub(crate) async fn wait_idle(&self) {
        let mut rx = self.outstanding.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = rx.wait_for(|n| *n == 0).await;
    }

    pub(crate) fn stats(&self) -> DispatcherStats {
        DispatcherStats {
            submitted: self.submitted.load(Ordering::SeqCst),
            completed: self.completed.load(Ordering::SeqCst),
            failed: self.failed.load(Ordering::SeqCst),
            cancelled: self.cancelled.load(Ordering::SeqCst),
            pending: *self.outstanding.borrow(),
        }
    }
}
