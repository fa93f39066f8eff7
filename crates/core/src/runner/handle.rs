//! Handle to a running batch.

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::pool::PoolStats;
use super::types::{BatchReport, BatchSummary, PoolStatus, RunEvent};

/// Error type for runner operations.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// The background dispatcher did not complete.
    #[error("Dispatcher failed: {0}")]
    Dispatcher(String),
}

/// A batch in progress.
///
/// Events arrive in dispatch order for starts and completion order for
/// results. Dropping the handle does not stop the batch; call
/// [`cancel`](Self::cancel) for that.
#[derive(Debug)]
pub struct RunHandle {
    batch_id: Uuid,
    max_concurrent: usize,
    events: mpsc::Receiver<RunEvent>,
    cancel: CancellationToken,
    stats: Arc<PoolStats>,
    join: JoinHandle<BatchSummary>,
}

impl RunHandle {
    pub(crate) fn new(
        batch_id: Uuid,
        max_concurrent: usize,
        events: mpsc::Receiver<RunEvent>,
        cancel: CancellationToken,
        stats: Arc<PoolStats>,
        join: JoinHandle<BatchSummary>,
    ) -> Self {
        Self {
            batch_id,
            max_concurrent,
            events,
            cancel,
            stats,
            join,
        }
    }

    /// Batch identifier.
    pub fn batch_id(&self) -> Uuid {
        self.batch_id
    }

    /// Next event, or `None` once the batch has finished and all events were
    /// consumed.
    pub async fn recv(&mut self) -> Option<RunEvent> {
        self.events.recv().await
    }

    /// Stops dispatching and kills running processes.
    ///
    /// Results already reported stay valid.
    pub fn cancel(&self) {
        if !self.cancel.is_cancelled() {
            tracing::info!(batch_id = %self.batch_id, "Cancelling batch");
        }
        self.cancel.cancel();
    }

    /// Token that cancels this batch, for wiring to signal handlers.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Current slot accounting.
    pub fn status(&self) -> PoolStatus {
        self.stats.to_status(self.max_concurrent)
    }

    /// Waits for the batch and returns the summary, discarding any events not
    /// yet consumed.
    pub async fn wait(mut self) -> Result<BatchSummary, RunnerError> {
        while self.events.recv().await.is_some() {}
        self.join
            .await
            .map_err(|e| RunnerError::Dispatcher(e.to_string()))
    }

    /// Drains remaining events into a report ordered by sequence index.
    pub async fn collect(mut self) -> Result<BatchReport, RunnerError> {
        let mut results = Vec::new();
        while let Some(event) = self.events.recv().await {
            if let RunEvent::TaskFinished { result } = event {
                results.push(result);
            }
        }
        results.sort_by_key(|r| r.sequence_index());

        let summary = self
            .join
            .await
            .map_err(|e| RunnerError::Dispatcher(e.to_string()))?;

        Ok(BatchReport { results, summary })
    }
}
