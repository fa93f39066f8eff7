//! Types for the converter module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// What a successful converter process left behind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    /// Written DNG.
    pub output_path: PathBuf,
    /// Process exit code (always 0 on success).
    pub exit_code: i32,
    /// stdout followed by stderr.
    pub output: String,
    /// Wall time in milliseconds.
    pub duration_ms: u64,
}

/// Result of validating a converter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConverterInfo {
    /// Converter implementation name.
    pub name: String,
    /// Resolved executable.
    pub executable: PathBuf,
    /// Version string, when the executable reports one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Joins captured stdout and stderr into one block of text.
pub(crate) fn join_output(stdout: &str, stderr: &str) -> String {
    match (stdout.is_empty(), stderr.is_empty()) {
        (true, _) => stderr.to_string(),
        (false, true) => stdout.to_string(),
        (false, false) if stdout.ends_with('\n') => format!("{}{}", stdout, stderr),
        (false, false) => format!("{}\n{}", stdout, stderr),
    }
}
