//! Types for the runner module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

use crate::converter::{ConversionOutput, ConverterError};
use crate::enumerator::ConversionTask;

/// Terminal status of one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Converter exited 0 and wrote the DNG.
    Success,
    /// Launch error, non-zero exit, timeout, missing output, or killed mid-run.
    Failed,
    /// Never dispatched because the run was cancelled.
    Cancelled,
}

impl JobStatus {
    /// Lower-case label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether a process was started for this task.
    pub fn was_run(&self) -> bool {
        !matches!(self, Self::Cancelled)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one task. Exactly one per enumerated task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResult {
    /// Originating task.
    pub task: ConversionTask,
    /// Terminal status.
    pub status: JobStatus,
    /// Process exit code, if the process exited.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    /// stdout followed by stderr.
    pub captured_output: String,
    /// Diagnostic for non-successful results.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Wall time spent on this task in milliseconds.
    pub duration_ms: u64,
}

impl JobResult {
    /// Sequence index of the originating task.
    pub fn sequence_index(&self) -> usize {
        self.task.sequence_index
    }

    /// Whether the task produced its DNG.
    pub fn is_success(&self) -> bool {
        self.status == JobStatus::Success
    }

    pub(crate) fn from_conversion(
        task: ConversionTask,
        conversion: Result<ConversionOutput, ConverterError>,
        duration_ms: u64,
    ) -> Self {
        match conversion {
            Ok(output) => Self {
                task,
                status: JobStatus::Success,
                exit_code: Some(output.exit_code),
                captured_output: output.output,
                error: None,
                duration_ms,
            },
            Err(e) => {
                let captured_output = e
                    .captured_output()
                    .map(str::to_string)
                    .unwrap_or_else(|| e.to_string());
                Self {
                    task,
                    status: JobStatus::Failed,
                    exit_code: e.exit_code(),
                    captured_output,
                    error: Some(e.to_string()),
                    duration_ms,
                }
            }
        }
    }

    pub(crate) fn not_run(task: ConversionTask) -> Self {
        Self {
            task,
            status: JobStatus::Cancelled,
            exit_code: None,
            captured_output: String::new(),
            error: Some("not run: batch cancelled".to_string()),
            duration_ms: 0,
        }
    }

    /// A dispatched task whose supervisor died before reporting.
    pub(crate) fn abandoned(task: ConversionTask, reason: &str) -> Self {
        Self {
            task,
            status: JobStatus::Failed,
            exit_code: None,
            captured_output: String::new(),
            error: Some(format!("task ended without a result: {}", reason)),
            duration_ms: 0,
        }
    }

    pub(crate) fn panicked(task: ConversionTask, message: String, duration_ms: u64) -> Self {
        Self {
            task,
            status: JobStatus::Failed,
            exit_code: None,
            captured_output: String::new(),
            error: Some(format!("converter panicked: {}", message)),
            duration_ms,
        }
    }
}

/// Final counts for a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Batch identifier.
    pub batch_id: Uuid,
    /// Number of tasks submitted.
    pub total: usize,
    /// Tasks that produced a DNG.
    pub succeeded: usize,
    /// Tasks that ran and failed.
    pub failed: usize,
    /// Tasks never dispatched.
    pub cancelled: usize,
    /// Whether the user aborted the run.
    pub was_cancelled: bool,
    /// Wall time for the batch in milliseconds.
    pub duration_ms: u64,
}

impl BatchSummary {
    pub(crate) fn new(batch_id: Uuid, total: usize) -> Self {
        Self {
            batch_id,
            total,
            succeeded: 0,
            failed: 0,
            cancelled: 0,
            was_cancelled: false,
            duration_ms: 0,
        }
    }

    pub(crate) fn record(&mut self, result: &JobResult) {
        match result.status {
            JobStatus::Success => self.succeeded += 1,
            JobStatus::Failed => self.failed += 1,
            JobStatus::Cancelled => self.cancelled += 1,
        }
    }

    /// Number of results recorded so far.
    pub fn reported(&self) -> usize {
        self.succeeded + self.failed + self.cancelled
    }

    /// Whether every task succeeded.
    pub fn all_succeeded(&self) -> bool {
        self.succeeded == self.total && !self.was_cancelled
    }
}

/// Event sent to the presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RunEvent {
    /// Batch accepted, nothing dispatched yet.
    BatchStarted {
        batch_id: Uuid,
        total_tasks: usize,
        max_concurrent: usize,
    },
    /// A converter process was dispatched.
    TaskStarted {
        sequence_index: usize,
        source_path: PathBuf,
        output_path: PathBuf,
    },
    /// A task reached its terminal status.
    TaskFinished { result: JobResult },
    /// Every task has reported; always the last event.
    BatchFinished { summary: BatchSummary },
}

/// All results of a batch, ordered by sequence index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    /// One result per task.
    pub results: Vec<JobResult>,
    /// Final counts.
    pub summary: BatchSummary,
}

/// Live slot accounting for a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolStatus {
    /// Processes running now.
    pub active_jobs: usize,
    /// Most processes ever running at once.
    pub peak_active_jobs: usize,
    /// Concurrency limit.
    pub max_concurrent: usize,
    /// Tasks waiting for a slot.
    pub queued_jobs: usize,
    /// Tasks whose process has finished.
    pub total_processed: u64,
    /// Of those, how many failed.
    pub total_failed: u64,
}
