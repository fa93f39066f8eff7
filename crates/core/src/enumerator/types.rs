//! Types for the enumerator module.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Extension given to every converted file.
pub const DNG_EXTENSION: &str = "dng";

/// Base name used when the user leaves it blank.
pub const DEFAULT_BASE_NAME: &str = "output";

/// Raw extensions picked up when scanning a folder.
pub const RAW_EXTENSIONS: &[&str] = &["cr3", "cr2", "nef", "arw", "dng"];

/// One input file mapped to one output file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionTask {
    /// 1-based position in enumeration order.
    pub sequence_index: usize,
    /// Raw file to convert.
    pub source_path: PathBuf,
    /// Folder receiving the DNG.
    pub destination_folder: PathBuf,
    /// Output file stem, already disambiguated.
    pub output_base_name: String,
}

impl ConversionTask {
    /// Full path of the DNG this task produces.
    pub fn output_path(&self) -> PathBuf {
        self.destination_folder
            .join(format!("{}.{}", self.output_base_name, DNG_EXTENSION))
    }

    /// File name of the source, for display.
    pub fn source_name(&self) -> String {
        display_name(&self.source_path)
    }
}

pub(crate) fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

/// What the user selected for a run.
#[derive(Debug, Clone)]
pub struct EnumerationRequest {
    /// Files and folders, in selection order.
    pub inputs: Vec<PathBuf>,
    /// Folder receiving the DNGs.
    pub output_folder: PathBuf,
    /// Output base name; blank falls back to [`DEFAULT_BASE_NAME`].
    pub base_name: String,
    /// Lower-case extensions accepted when scanning folders.
    pub extensions: Vec<String>,
}

impl EnumerationRequest {
    /// Creates a request with the default raw extensions.
    pub fn new(
        inputs: Vec<PathBuf>,
        output_folder: impl Into<PathBuf>,
        base_name: impl Into<String>,
    ) -> Self {
        Self {
            inputs,
            output_folder: output_folder.into(),
            base_name: base_name.into(),
            extensions: RAW_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }

    /// Replaces the extensions accepted when scanning folders.
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extensions = extensions
            .into_iter()
            .map(|e| e.as_ref().trim_start_matches('.').to_ascii_lowercase())
            .collect();
        self
    }

    pub(crate) fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| {
                let e = e.to_ascii_lowercase();
                self.extensions.iter().any(|x| *x == e)
            })
            .unwrap_or(false)
    }
}
