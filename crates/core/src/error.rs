//! Errors that abort a run before any process is dispatched.

use std::path::PathBuf;
use thiserror::Error;

/// Invalid run input, surfaced immediately and never recovered per task.
#[derive(Debug, Error)]
pub enum InvalidInputError {
    /// No input files were selected, or scanning found none.
    #[error("No input files to convert")]
    EmptyInput,

    /// An input path does not exist.
    #[error("Input not found: {path}")]
    InputNotFound { path: PathBuf },

    /// Output base name is unusable as a file name stem.
    #[error("Invalid output base name {name:?}: {reason}")]
    InvalidBaseName { name: String, reason: String },

    /// Output folder could not be created or written to.
    #[error("Output folder is not writable: {path} ({reason})")]
    OutputNotWritable { path: PathBuf, reason: String },

    /// An input file is also the output of some task.
    #[error("Input {path} would be overwritten by a converted file; choose another output folder or base name")]
    InputIsOutput { path: PathBuf },

    /// Converter executable is missing or not runnable.
    #[error("Converter executable not found: {path}")]
    ExecutableNotFound { path: PathBuf },

    /// Converter failed validation for a reason other than a missing binary.
    #[error("Converter unavailable: {reason}")]
    ConverterUnavailable { reason: String },

    /// Concurrency limit below one.
    #[error("max_concurrent_jobs must be at least 1, got {value}")]
    InvalidConcurrency { value: usize },

    /// Failed to read an input directory.
    #[error("Failed to scan {path}: {source}")]
    Scan {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl InvalidInputError {
    /// Creates an output-not-writable error.
    pub fn output_not_writable(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::OutputNotWritable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Creates an invalid base name error.
    pub fn invalid_base_name(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidBaseName {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
