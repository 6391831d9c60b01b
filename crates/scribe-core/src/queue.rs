//! Unbounded multi-producer, single-consumer FIFO of pending work
//!
//! Enqueueing never blocks. The single consumer polls with a timeout so the
//! worker can notice shutdown without busy-spinning.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;

/// Result of a timed dequeue
#[derive(Debug, PartialEq, Eq)]
pub enum Dequeue<T> {
    /// The oldest pending item
    Item(T),
    /// Nothing arrived before the timeout
    TimedOut,
    /// All producers are gone and the queue is drained
    Closed,
}

/// Create a connected queue and receiver pair
pub fn task_queue<T>() -> (TaskQueue<T>, TaskReceiver<T>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let depth = Arc::new(AtomicUsize::new(0));
    (
        TaskQueue {
            tx,
            depth: Arc::clone(&depth),
        },
        TaskReceiver { rx, depth },
    )
}

/// Producer side; cheap to clone
#[derive(Debug)]
pub struct TaskQueue<T> {
    tx: mpsc::UnboundedSender<T>,
    depth: Arc<AtomicUsize>,
}

impl<T> Clone for TaskQueue<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            depth: Arc::clone(&self.depth),
        }
    }
}

impl<T> TaskQueue<T> {
    /// Append an item without blocking.
    ///
    /// Fails only once the receiver is gone, handing the item back.
    pub fn enqueue(&self, item: T) -> Result<(), T> {
        // Count first so a fast consumer never observes a negative depth.
        self.depth.fetch_add(1, Ordering::SeqCst);
        self.tx.send(item).map_err(|err| {
            self.depth.fetch_sub(1, Ordering::SeqCst);
            err.0
        })
    }

    /// Number of items waiting to be dequeued
    pub fn len(&self) -> usize {
        self.depth.load(Ordering::SeqCst)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the consumer side has been closed or dropped
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer side; exactly one exists per queue
#[derive(Debug)]
pub struct TaskReceiver<T> {
    rx: mpsc::UnboundedReceiver<T>,
    depth: Arc<AtomicUsize>,
}

impl<T> TaskReceiver<T> {
    /// Wait up to `timeout` for the oldest pending item
    pub async fn dequeue_timeout(&mut self, timeout: Duration) -> Dequeue<T> {
        match tokio::time::timeout(timeout, self.rx.recv()).await {
            Ok(Some(item)) => {
                self.depth.fetch_sub(1, Ordering::SeqCst);
                Dequeue::Item(item)
            }
            Ok(None) => Dequeue::Closed,
            Err(_) => Dequeue::TimedOut,
        }
    }

    /// Take the oldest pending item if one is ready
    pub fn try_dequeue(&mut self) -> Option<T> {
        let item = self.rx.try_recv().ok()?;
        self.depth.fetch_sub(1, Ordering::SeqCst);
        Some(item)
    }

    /// Refuse further enqueues; items already queued can still be dequeued
    pub fn close(&mut self) {
        self.rx.close();
    }

    /// Number of items waiting to be dequeued
    pub fn len(&self) -> usize {
        self.depth.load(Ordering::SeqCst)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
