//! Bounded batch runner implementation.

use futures::FutureExt;
use std::collections::{BTreeMap, VecDeque};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::converter::{Converter, ConverterError};
use crate::enumerator::ConversionTask;
use crate::error::InvalidInputError;
use crate::metrics;

use super::config::RunnerConfig;
use super::handle::RunHandle;
use super::pool::PoolStats;
use super::types::{BatchSummary, JobResult, JobStatus, RunEvent};

/// Runs conversion tasks as external processes, never more than
/// `max_concurrent` at once.
pub struct BatchRunner<C: Converter> {
    config: RunnerConfig,
    converter: Arc<C>,
}

impl<C: Converter + 'static> BatchRunner<C> {
    /// Creates a runner with default configuration.
    pub fn new(converter: C) -> Self {
        Self::with_config(RunnerConfig::default(), converter)
    }

    /// Creates a runner with the given configuration.
    pub fn with_config(config: RunnerConfig, converter: C) -> Self {
        Self {
            config,
            converter: Arc::new(converter),
        }
    }

    /// Returns the converter this runner dispatches to.
    pub fn converter(&self) -> &C {
        &self.converter
    }

    /// Validates the run and starts dispatching in the background.
    ///
    /// Nothing is dispatched when this returns an error. On success, every
    /// task yields exactly one [`RunEvent::TaskFinished`], followed by a
    /// single [`RunEvent::BatchFinished`].
    pub async fn run(
        &self,
        tasks: Vec<ConversionTask>,
        max_concurrent: usize,
    ) -> Result<RunHandle, InvalidInputError> {
        if max_concurrent == 0 {
            return Err(InvalidInputError::InvalidConcurrency {
                value: max_concurrent,
            });
        }
        if tasks.is_empty() {
            return Err(InvalidInputError::EmptyInput);
        }

        if self.config.validate_converter {
            self.converter.validate().await.map_err(|e| match e {
                ConverterError::ExecutableNotFound { path } => {
                    InvalidInputError::ExecutableNotFound { path }
                }
                other => InvalidInputError::ConverterUnavailable {
                    reason: other.to_string(),
                },
            })?;
        }

        let batch_id = Uuid::new_v4();
        let cancel = CancellationToken::new();
        let stats = Arc::new(PoolStats::with_queued(tasks.len()));
        let (tx, rx) = mpsc::channel(self.config.event_buffer.max(1));

        tracing::info!(
            %batch_id,
            tasks = tasks.len(),
            max_concurrent,
            converter = self.converter.name(),
            "Starting batch"
        );

        let join = tokio::spawn(dispatch(
            Arc::clone(&self.converter),
            tasks,
            max_concurrent,
            Arc::clone(&stats),
            tx,
            cancel.clone(),
            batch_id,
        ));

        Ok(RunHandle::new(batch_id, max_concurrent, rx, cancel, stats, join))
    }
}

async fn emit(events: &mpsc::Sender<RunEvent>, event: RunEvent) {
    if events.send(event).await.is_err() {
        tracing::debug!("Event receiver dropped");
    }
}

/// Dispatches tasks in order, one per free slot, until done or cancelled.
async fn dispatch<C: Converter + 'static>(
    converter: Arc<C>,
    tasks: Vec<ConversionTask>,
    max_concurrent: usize,
    stats: Arc<PoolStats>,
    events: mpsc::Sender<RunEvent>,
    cancel: CancellationToken,
    batch_id: Uuid,
) -> BatchSummary {
    let start = Instant::now();
    let mut summary = BatchSummary::new(batch_id, tasks.len());
    let semaphore = Arc::new(Semaphore::new(max_concurrent));
    let mut in_flight = JoinSet::new();
    let mut outstanding = BTreeMap::new();
    let mut pending: VecDeque<ConversionTask> = tasks.into();

    emit(
        &events,
        RunEvent::BatchStarted {
            batch_id,
            total_tasks: summary.total,
            max_concurrent,
        },
    )
    .await;

    while let Some(task) = pending.pop_front() {
        let permit = tokio::select! {
            biased;
            () = cancel.cancelled() => None,
            permit = Arc::clone(&semaphore).acquire_owned() => permit.ok(),
        };
        let Some(permit) = permit.filter(|_| !cancel.is_cancelled()) else {
            pending.push_front(task);
            break;
        };

        stats.start_job();
        let slot = Slot {
            stats: Arc::clone(&stats),
            permit: Some(permit),
        };
        tracing::debug!(
            index = task.sequence_index,
            source = %task.source_path.display(),
            "Dispatching task"
        );
        emit(
            &events,
            RunEvent::TaskStarted {
                sequence_index: task.sequence_index,
                source_path: task.source_path.clone(),
                output_path: task.output_path(),
            },
        )
        .await;

        outstanding.insert(task.sequence_index, task.clone());
        in_flight.spawn(run_task(
            Arc::clone(&converter),
            task,
            slot,
            events.clone(),
            cancel.child_token(),
        ));
    }

    if !pending.is_empty() {
        tracing::info!(
            %batch_id,
            remaining = pending.len(),
            "Batch cancelled, skipping remaining tasks"
        );
    }
    for task in pending.drain(..) {
        stats.dequeue();
        let result = JobResult::not_run(task);
        summary.record(&result);
        metrics::record_job(&result);
        emit(&events, RunEvent::TaskFinished { result }).await;
    }

    join_in_flight(&mut in_flight, outstanding, &mut summary, &events, batch_id).await;

    summary.was_cancelled = cancel.is_cancelled();
    summary.duration_ms = start.elapsed().as_millis() as u64;
    metrics::record_batch(&summary);

    tracing::info!(
        %batch_id,
        succeeded = summary.succeeded,
        failed = summary.failed,
        cancelled = summary.cancelled,
        duration_ms = summary.duration_ms,
        "Batch finished"
    );

    emit(
        &events,
        RunEvent::BatchFinished {
            summary: summary.clone(),
        },
    )
    .await;

    summary
}

/// Waits for every dispatched task.
///
/// `outstanding` holds the dispatched tasks by sequence index. Any still
/// listed once the set is drained never produced a result, and is reported
/// `Failed` here so each task still gets exactly one result.
async fn join_in_flight(
    in_flight: &mut JoinSet<JobResult>,
    mut outstanding: BTreeMap<usize, ConversionTask>,
    summary: &mut BatchSummary,
    events: &mpsc::Sender<RunEvent>,
    batch_id: Uuid,
) {
    let mut failure = None;
    while let Some(joined) = in_flight.join_next().await {
        match joined {
            Ok(result) => {
                outstanding.remove(&result.sequence_index());
                summary.record(&result);
            }
            Err(e) => {
                tracing::error!(%batch_id, error = %e, "Task supervisor failed");
                failure = Some(e.to_string());
            }
        }
    }

    for task in outstanding.into_values() {
        let result = JobResult::abandoned(task, failure.as_deref().unwrap_or("task aborted"));
        tracing::warn!(
            %batch_id,
            index = result.sequence_index(),
            "Reporting task lost by its supervisor as failed"
        );
        summary.record(&result);
        metrics::record_job(&result);
        emit(events, RunEvent::TaskFinished { result }).await;
    }
}

/// A held process slot.
///
/// Dropping it without [`Slot::release`] counts the job as failed, so the
/// pool stays balanced even when a task dies mid-flight.
struct Slot {
    stats: Arc<PoolStats>,
    permit: Option<OwnedSemaphorePermit>,
}

impl Slot {
    fn release(mut self, status: JobStatus) {
        self.stats.finish_job(status);
        self.permit.take();
    }
}

impl Drop for Slot {
    fn drop(&mut self) {
        if self.permit.take().is_some() {
            self.stats.finish_job(JobStatus::Failed);
        }
    }
}

/// Runs one task while holding its slot, then reports it.
async fn run_task<C: Converter>(
    converter: Arc<C>,
    task: ConversionTask,
    slot: Slot,
    events: mpsc::Sender<RunEvent>,
    cancel: CancellationToken,
) -> JobResult {
    let start = Instant::now();
    let outcome = AssertUnwindSafe(converter.convert(&task, cancel))
        .catch_unwind()
        .await;
    let duration_ms = start.elapsed().as_millis() as u64;

    let result = match outcome {
        Ok(conversion) => JobResult::from_conversion(task, conversion, duration_ms),
        Err(panic) => JobResult::panicked(task, panic_message(panic.as_ref()), duration_ms),
    };

    slot.release(result.status);

    if result.is_success() {
        tracing::info!(
            index = result.sequence_index(),
            output = %result.task.output_path().display(),
            duration_ms,
            "Task succeeded"
        );
    } else {
        tracing::warn!(
            index = result.sequence_index(),
            source = %result.task.source_path.display(),
            error = result.error.as_deref().unwrap_or("unknown"),
            "Task failed"
        );
    }

    metrics::record_job(&result);
    emit(
        &events,
        RunEvent::TaskFinished {
            result: result.clone(),
        },
    )
    .await;

    result
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
