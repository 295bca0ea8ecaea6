//! Feed Task Supervisor - Lifecycle Management for the Live Feed
//!
//! Spawns the market feed listener as its own tokio task and owns the
//! shutdown channel, the shared buffer and the status watch. Callers
//! read snapshots without ever blocking the listener for long.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, watch, RwLock};
use tokio::task::JoinHandle;
use tracing::{error, info, instrument, warn};

use super::market_feed::{FeedSettings, MarketFeedListener};
use crate::adapters::metrics::MetricsRegistry;
use crate::adapters::persistence::FeedRecorder;
use crate::domain::{AccessToken, FeedBuffer, FeedMessage, FeedStatus};
use crate::ports::TradingBackend;

/// Grace period for the listener to close its socket on stop.
const STOP_TIMEOUT: Duration = Duration::from_secs(3);

/// Handle to a running (or finished) feed listener task.
pub struct FeedHandle {
    buffer: Arc<RwLock<FeedBuffer>>,
    status_rx: watch::Receiver<FeedStatus>,
    shutdown_tx: broadcast::Sender<()>,
    task: Option<JoinHandle<()>>,
}

impl FeedHandle {
    /// Spawn a listener task with a fresh buffer.
    #[instrument(skip_all, fields(capacity = settings.buffer_capacity))]
    pub fn spawn(
        backend: Arc<dyn TradingBackend>,
        token: AccessToken,
        settings: FeedSettings,
        recorder: Option<FeedRecorder>,
        metrics: Option<MetricsRegistry>,
    ) -> Self {
        let buffer = Arc::new(RwLock::new(FeedBuffer::new(settings.buffer_capacity)));
        let (status_tx, status_rx) = watch::channel(FeedStatus::Idle);
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let mut listener =
            MarketFeedListener::new(backend, token, settings, Arc::clone(&buffer), status_tx);
        if let Some(recorder) = recorder {
            listener = listener.with_recorder(recorder);
        }
        if let Some(metrics) = metrics {
            listener = listener.with_metrics(metrics);
        }

        let task = tokio::spawn(async move {
            match listener.run(shutdown_rx).await {
                Ok(()) => info!("Market feed exited normally"),
                Err(e) => error!(error = %e, "Market feed stopped"),
            }
        });

        info!("Market feed task spawned");
        Self {
            buffer,
            status_rx,
            shutdown_tx,
            task: Some(task),
        }
    }

    /// Current listener status.
    pub fn status(&self) -> FeedStatus {
        self.status_rx.borrow().clone()
    }

    /// Receiver for status changes.
    pub fn watch_status(&self) -> watch::Receiver<FeedStatus> {
        self.status_rx.clone()
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished()) && self.status().is_running()
    }

    /// Buffered messages, oldest first.
    pub async fn snapshot(&self) -> Vec<FeedMessage> {
        self.buffer.read().await.snapshot()
    }

    /// Messages received since spawn, evicted ones included.
    pub async fn total_received(&self) -> u64 {
        self.buffer.read().await.total_received()
    }

    pub fn buffer(&self) -> Arc<RwLock<FeedBuffer>> {
        Arc::clone(&self.buffer)
    }

    /// Signal shutdown and wait briefly for the task to finish.
    pub async fn stop(&mut self) {
        // No receiver left means the task already ended.
        let _ = self.shutdown_tx.send(());
        if let Some(task) = self.task.take() {
            join_or_abort(task, STOP_TIMEOUT).await;
        }
    }
}

/// Wait up to `grace` for `task`, then abort it. Returns whether it was aborted.
async fn join_or_abort(mut task: JoinHandle<()>, grace: Duration) -> bool {
    match tokio::time::timeout(grace, &mut task).await {
        Ok(Ok(())) => false,
        Ok(Err(e)) => {
            warn!(error = %e, "Market feed task panicked");
            false
        }
        Err(_) => {
            warn!("Market feed task did not stop in time, aborting");
            task.abort();
            true
        }
    }
}

impl Drop for FeedHandle {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stuck_task_is_aborted_after_grace() {
        let task = tokio::spawn(std::future::pending::<()>());
        let abort = task.abort_handle();
        assert!(join_or_abort(task, Duration::from_millis(20)).await);
        for _ in 0..100 {
            if abort.is_finished() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(abort.is_finished());
    }

    #[tokio::test]
    async fn test_finished_task_is_joined() {
        let task = tokio::spawn(async {});
        assert!(!join_or_abort(task, Duration::from_secs(1)).await);
    }
}
