//! Error types for the converter module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during conversion.
#[derive(Debug, Error)]
pub enum ConverterError {
    /// Converter binary not found.
    #[error("Converter executable not found: {path}")]
    ExecutableNotFound { path: PathBuf },

    /// Process could not be started.
    #[error("Failed to launch {path}: {source}")]
    Launch {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Output directory does not exist and could not be created.
    #[error("Failed to create output directory: {path}")]
    OutputDirectoryFailed { path: PathBuf },

    /// Process exited unsuccessfully. `code` is `None` when killed by a signal.
    #[error("Converter exited with {}", describe_exit(*code))]
    NonZeroExit { code: Option<i32>, output: String },

    /// Process reported success but wrote nothing.
    #[error("Converter exited successfully but produced no output at {path}")]
    MissingOutput { path: PathBuf, output: String },

    /// Conversion timed out.
    #[error("Conversion timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64, output: String },

    /// Job was cancelled while running.
    #[error("Conversion terminated by cancellation")]
    Cancelled { output: String },

    /// I/O error while supervising the process.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn describe_exit(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

impl ConverterError {
    /// Creates a non-zero exit error.
    pub fn non_zero_exit(code: Option<i32>, output: impl Into<String>) -> Self {
        Self::NonZeroExit {
            code,
            output: output.into(),
        }
    }

    /// Process exit code, when the process ran to an exit.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::NonZeroExit { code, .. } => *code,
            Self::MissingOutput { .. } => Some(0),
            _ => None,
        }
    }

    /// Whatever the process printed before the failure.
    pub fn captured_output(&self) -> Option<&str> {
        match self {
            Self::NonZeroExit { output, .. }
            | Self::MissingOutput { output, .. }
            | Self::Timeout { output, .. }
            | Self::Cancelled { output } => Some(output.as_str()),
            _ => None,
        }
    }

    /// Whether the process never started.
    pub fn is_launch_error(&self) -> bool {
        matches!(self, Self::ExecutableNotFound { .. } | Self::Launch { .. })
    }

    /// Whether this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Io(_))
    }
}
