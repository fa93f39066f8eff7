//! Console presentation of run events.

use std::io::{self, Write};
use std::path::Path;

use burstdng_core::{BatchSummary, JobResult, JobStatus, RunEvent};

/// How events are written to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Timestamped status lines.
    Text,
    /// One JSON object per event.
    Json,
}

/// Writes run events as they arrive.
pub struct Reporter<W: Write> {
    format: OutputFormat,
    out: W,
    total: usize,
    verbose: bool,
}

impl<W: Write> Reporter<W> {
    pub fn new(format: OutputFormat, out: W) -> Self {
        Self {
            format,
            out,
            total: 0,
            verbose: false,
        }
    }

    /// Also show dnglab's output for successful conversions.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn event(&mut self, event: &RunEvent) -> io::Result<()> {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_writer(&mut self.out, event)?;
                writeln!(self.out)?;
            }
            OutputFormat::Text => self.text(event)?,
        }
        self.out.flush()
    }

    fn text(&mut self, event: &RunEvent) -> io::Result<()> {
        match event {
            RunEvent::BatchStarted {
                total_tasks,
                max_concurrent,
                ..
            } => {
                self.total = *total_tasks;
                writeln!(
                    self.out,
                    "[{}] Converting {} file(s), up to {} at a time",
                    timestamp(),
                    total_tasks,
                    max_concurrent
                )
            }
            RunEvent::TaskStarted {
                sequence_index,
                source_path,
                output_path,
            } => writeln!(
                self.out,
                "[{}] [{}/{}] started   {} -> {}",
                timestamp(),
                sequence_index,
                self.total,
                file_name(source_path),
                file_name(output_path)
            ),
            RunEvent::TaskFinished { result } => self.finished(result),
            RunEvent::BatchFinished { summary } => self.summary(summary),
        }
    }

    fn finished(&mut self, result: &JobResult) -> io::Result<()> {
        let position = format!("[{}/{}]", result.sequence_index(), self.total);
        match result.status {
            JobStatus::Success => {
                writeln!(
                    self.out,
                    "[{}] {} success   {} -> {} ({})",
                    timestamp(),
                    position,
                    result.task.source_name(),
                    result.task.output_path().display(),
                    seconds(result.duration_ms)
                )?;
                if self.verbose {
                    self.captured(&result.captured_output)?;
                }
                Ok(())
            }
            JobStatus::Failed => {
                writeln!(
                    self.out,
                    "[{}] {} failed    {}: {}",
                    timestamp(),
                    position,
                    result.task.source_name(),
                    result.error.as_deref().unwrap_or("conversion failed")
                )?;
                self.captured(&result.captured_output)
            }
            JobStatus::Cancelled => writeln!(
                self.out,
                "[{}] {} cancelled {}",
                timestamp(),
                position,
                result.task.source_name()
            ),
        }
    }

    fn captured(&mut self, output: &str) -> io::Result<()> {
        for line in output.lines().filter(|l| !l.trim().is_empty()) {
            writeln!(self.out, "    | {}", line)?;
        }
        Ok(())
    }

    fn summary(&mut self, summary: &BatchSummary) -> io::Result<()> {
        if summary.was_cancelled {
            writeln!(self.out, "[{}] run cancelled", timestamp())?;
        }
        writeln!(
            self.out,
            "[{}] Done: {} succeeded, {} failed, {} cancelled of {} in {}",
            timestamp(),
            summary.succeeded,
            summary.failed,
            summary.cancelled,
            summary.total,
            seconds(summary.duration_ms)
        )
    }
}

/// Process exit code for a finished batch.
pub fn exit_code(summary: &BatchSummary) -> i32 {
    if summary.was_cancelled {
        2
    } else if summary.all_succeeded() {
        0
    } else {
        1
    }
}

fn timestamp() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn seconds(ms: u64) -> String {
    format!("{:.1}s", ms as f64 / 1000.0)
}
