//! Fire-and-forget background work.
//!
//! Capture persistence and blob indexing run detached from the caller that
//! triggered them: the caller's response must never wait on them, but the
//! process must keep them alive until they finish. [`BackgroundTasks`] makes
//! that contract explicit instead of relying on an ambient runtime hook:
//! spawned futures run to completion, and [`shutdown`](BackgroundTasks::shutdown)
//! drains whatever is still in flight. Failures inside a task are the task's
//! own business: it logs and ends; nothing propagates to the trigger.

use std::future::Future;
use tokio_util::task::TaskTracker;

/// Registry of detached best-effort tasks.
#[derive(Clone, Default)]
pub struct BackgroundTasks {
    tracker: TaskTracker,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn a detached unit of work. The future is kept alive until it
    /// completes regardless of what the spawning caller does next.
    pub fn spawn<F>(&self, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tracker.spawn(future);
    }

    /// Number of tasks still in flight.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Close the registry and wait for every in-flight task to finish.
    /// Tests also use this to make "eventually persisted" deterministic.
    pub async fn shutdown(&self) {
        self.tracker.close();
        self.tracker.wait().await;
    }
}
