// SPDX-FileCopyrightText: 2026 Local-Mind Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Supervised pool for detached background work.
//!
//! Fact upserts, session titling, model pulls, and the TTL sweeper all run
//! here instead of bare `tokio::spawn`, so shutdown can wait for them or
//! abandon them deterministically.

use std::future::Future;
use std::time::Duration;

use localmind_core::LocalMindError;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

/// Tracks detached tasks and drains them on shutdown.
#[derive(Debug, Clone, Default)]
pub struct TaskPool {
    tracker: TaskTracker,
    abandon: CancellationToken,
}

impl TaskPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `fut` detached. Its error, if any, is logged with `kind`.
    pub fn spawn<F>(&self, kind: &'static str, fut: F)
    where
        F: Future<Output = Result<(), LocalMindError>> + Send + 'static,
    {
        let abandon = self.abandon.clone();
        self.tracker.spawn(async move {
            tokio::select! {
                result = fut => match result {
                    Ok(()) => debug!(task = kind, "background task finished"),
                    Err(e) => warn!(task = kind, error = %e, "background task failed"),
                },
                () = abandon.cancelled() => {
                    debug!(task = kind, "background task abandoned");
                }
            }
        });
    }

    /// Number of tasks still running.
    pub fn len(&self) -> usize {
        self.tracker.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracker.is_empty()
    }

    /// Closes the tracker and waits up to `timeout` for in-flight work, then
    /// abandons the rest. Returns how many tasks were abandoned.
    pub async fn shutdown(&self, timeout: Duration) -> usize {
        self.tracker.close();
        let pending = self.tracker.len();
        if pending == 0 {
            debug!("no background tasks to drain");
            return 0;
        }

        info!(pending, "waiting for background tasks");
        if tokio::time::timeout(timeout, self.tracker.wait()).await.is_ok() {
            info!("background tasks drained");
            return 0;
        }

        let abandoned = self.tracker.len();
        self.abandon.cancel();
        self.tracker.wait().await;
        warn!(abandoned, "drain timeout reached, background tasks abandoned");
        abandoned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn spawned_tasks_run_to_completion() {
        let pool = TaskPool::new();
        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..5 {
            let c = counter.clone();
            pool.spawn("count", async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        }
        assert_eq!(pool.shutdown(Duration::from_secs(5)).await, 0);
        assert_eq!(counter.load(Ordering::SeqCst), 5);
        assert!(pool.is_empty());
    }

    #[tokio::test]
    async fn failing_task_does_not_poison_pool() {
        let pool = TaskPool::new();
        pool.spawn("fails", async { Err(LocalMindError::Internal("boom".into())) });
        pool.spawn("ok", async { Ok(()) });
        assert_eq!(pool.shutdown(Duration::from_secs(5)).await, 0);
    }

    #[tokio::test]
    async fn shutdown_abandons_slow_tasks() {
        let pool = TaskPool::new();
        pool.spawn("slow", async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(())
        });
        pool.spawn("fast", async { Ok(()) });
        tokio::task::yield_now().await;

        let abandoned = pool.shutdown(Duration::from_millis(50)).await;
        assert_eq!(abandoned, 1);
        assert!(pool.is_empty());
    }

    #[tokio::test]
    async fn shutdown_with_nothing_running_is_immediate() {
        let pool = TaskPool::new();
        assert_eq!(pool.shutdown(Duration::from_secs(1)).await, 0);
    }
}
