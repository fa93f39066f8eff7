//! Runner module: bounded concurrent execution of conversion tasks.
//!
//! The `BatchRunner` dispatches tasks in enumeration order, holding one
//! semaphore permit per running converter process, so no more than
//! `max_concurrent` processes ever run at once. Results stream back through a
//! channel as they complete, in whatever order the processes finish.
//!
//! A failed task never stops the batch. Cancelling stops dispatch, kills the
//! running processes (their partial output is discarded and the task reported
//! as failed), and reports every task that never started as cancelled.
//!
//! # Example
//!
//! ```ignore
//! use burstdng_core::runner::{BatchRunner, RunEvent};
//! use burstdng_core::converter::{ConverterConfig, DngLabConverter};
//!
//! let runner = BatchRunner::new(DngLabConverter::new(ConverterConfig::default()));
//! let mut handle = runner.run(tasks, 2).await?;
//!
//! while let Some(event) = handle.recv().await {
//!     if let RunEvent::TaskFinished { result } = event {
//!         println!("{} -> {}", result.sequence_index(), result.status);
//!     }
//! }
//! ```

mod batch;
mod config;
mod handle;
mod pool;
mod types;

pub use batch::BatchRunner;
pub use config::RunnerConfig;
pub use handle::{RunHandle, RunnerError};
pub use types::{BatchReport, BatchSummary, JobResult, JobStatus, PoolStatus, RunEvent};
