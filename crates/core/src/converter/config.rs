//! Configuration for the converter module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::config::Preferences;

/// Configuration for the DNGLab-based converter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConverterConfig {
    /// Path to the dnglab binary, or a command name looked up on PATH.
    #[serde(default = "default_executable_path")]
    pub executable_path: PathBuf,

    /// Value passed to `--image-index`.
    #[serde(default = "default_image_index")]
    pub image_index: String,

    /// Value passed to `--embed-raw`.
    #[serde(default)]
    pub embed_raw: bool,

    /// Timeout for a single conversion in seconds. `None` waits forever.
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Remove the output file when a conversion is killed.
    #[serde(default = "default_remove_partial")]
    pub remove_partial_output: bool,

    /// Additional arguments inserted before the input and output paths.
    #[serde(default)]
    pub extra_args: Vec<String>,
}

fn default_executable_path() -> PathBuf {
    PathBuf::from("dnglab")
}

fn default_image_index() -> String {
    "all".to_string()
}

fn default_remove_partial() -> bool {
    true
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            executable_path: default_executable_path(),
            image_index: default_image_index(),
            embed_raw: false,
            timeout_secs: None,
            remove_partial_output: default_remove_partial(),
            extra_args: Vec::new(),
        }
    }
}

impl ConverterConfig {
    /// Creates a config for the given executable.
    pub fn with_executable(executable_path: impl Into<PathBuf>) -> Self {
        Self {
            executable_path: executable_path.into(),
            ..Default::default()
        }
    }

    /// Builds the converter config from persisted preferences.
    pub fn from_preferences(prefs: &Preferences) -> Self {
        Self {
            executable_path: prefs.executable_path.clone(),
            timeout_secs: prefs.timeout_secs,
            ..Default::default()
        }
    }

    /// Sets the per-conversion timeout.
    pub fn timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }
}
