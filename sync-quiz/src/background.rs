//! Tracked background persistence.
//!
//! Operations that return before their write completes (update, delete)
//! hand the write to a spawned task. Tasks are kept so callers can wait for
//! them, and failures are recorded instead of being lost.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::error;

/// A background write that did not reach the remote.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistFailure {
    /// Operation that scheduled the write.
    pub operation: String,
    /// What went wrong.
    pub error: String,
    /// When the failure was recorded.
    pub at: DateTime<Utc>,
}

/// Handles and failures of background writes. Clones share state.
#[derive(Debug, Default, Clone)]
pub(crate) struct BackgroundTasks {
    handles: Arc<Mutex<Vec<JoinHandle<()>>>>,
    failures: Arc<Mutex<Vec<PersistFailure>>>,
}

impl BackgroundTasks {
    pub(crate) fn track(&self, handle: JoinHandle<()>) {
        let mut handles = self.handles.lock();
        handles.retain(|h| !h.is_finished());
        handles.push(handle);
    }

    pub(crate) fn record(&self, operation: &str, error: impl Into<String>) {
        let failure = PersistFailure {
            operation: operation.to_string(),
            error: error.into(),
            at: Utc::now(),
        };
        error!(operation, error = %failure.error, "background persist failed");
        self.failures.lock().push(failure);
    }

    pub(crate) fn failures(&self) -> Vec<PersistFailure> {
        self.failures.lock().clone()
    }

    pub(crate) fn clear_failures(&self) {
        self.failures.lock().clear();
    }

    pub(crate) fn pending(&self) -> usize {
        self.handles
            .lock()
            .iter()
            .filter(|h| !h.is_finished())
            .count()
    }

    /// Wait for every tracked task, including ones spawned while waiting.
    pub(crate) async fn flush(&self) {
        loop {
            let handles = std::mem::take(&mut *self.handles.lock());
            if handles.is_empty() {
                return;
            }
            for handle in handles {
                if let Err(e) = handle.await {
                    self.record("background", e.to_string());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn flush_waits_for_tracked_tasks() {
        let tasks = BackgroundTasks::default();
        let done = Arc::new(Mutex::new(false));
        let flag = Arc::clone(&done);
        tasks.track(tokio::spawn(async move {
            tokio::task::yield_now().await;
            *flag.lock() = true;
        }));

        tasks.flush().await;

        assert!(*done.lock());
        assert_eq!(tasks.pending(), 0);
    }

    #[tokio::test]
    async fn panicking_task_is_recorded() {
        let tasks = BackgroundTasks::default();
        tasks.track(tokio::spawn(async { panic!("boom") }));

        tasks.flush().await;

        let failures = tasks.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].operation, "background");
    }

    #[test]
    fn record_and_clear() {
        let tasks = BackgroundTasks::default();
        tasks.record("update", "remote unavailable");
        assert_eq!(tasks.failures()[0].error, "remote unavailable");

        tasks.clear_failures();
        assert!(tasks.failures().is_empty());
    }
}
