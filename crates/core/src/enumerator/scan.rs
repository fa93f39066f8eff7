//! Input scanning and output naming.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::InvalidInputError;

use super::types::{ConversionTask, EnumerationRequest, DEFAULT_BASE_NAME, DNG_EXTENSION};

/// Enumerates the conversion tasks for a request.
///
/// Same request, same filesystem: same task list.
pub fn enumerate(request: &EnumerationRequest) -> Result<Vec<ConversionTask>, InvalidInputError> {
    if request.inputs.is_empty() {
        return Err(InvalidInputError::EmptyInput);
    }

    let base_name = normalize_base_name(&request.base_name)?;
    let sources = collect_sources(request)?;
    if sources.is_empty() {
        return Err(InvalidInputError::EmptyInput);
    }

    probe_writable(&request.output_folder)?;

    let total = sources.len();
    let tasks: Vec<ConversionTask> = sources
        .into_iter()
        .enumerate()
        .map(|(idx, source_path)| ConversionTask {
            sequence_index: idx + 1,
            source_path,
            destination_folder: request.output_folder.clone(),
            output_base_name: output_base_name(&base_name, idx + 1, total),
        })
        .collect();

    reject_overwritten_inputs(&tasks)?;

    tracing::debug!(
        tasks = tasks.len(),
        output_folder = %request.output_folder.display(),
        "Enumerated conversion tasks"
    );

    Ok(tasks)
}

/// Output stem for the `index`-th (1-based) of `total` tasks.
///
/// A lone task keeps the base name; otherwise the index is appended,
/// zero-padded to at least three digits.
pub fn output_base_name(base_name: &str, index: usize, total: usize) -> String {
    if total <= 1 {
        return base_name.to_string();
    }
    let width = total.to_string().len().max(3);
    format!("{}-{:0width$}", base_name, index, width = width)
}

/// Creates `folder` if needed and checks that a file can be written into it.
pub fn probe_writable(folder: &Path) -> Result<(), InvalidInputError> {
    if folder.as_os_str().is_empty() {
        return Err(InvalidInputError::output_not_writable(folder, "no output folder given"));
    }

    std::fs::create_dir_all(folder)
        .map_err(|e| InvalidInputError::output_not_writable(folder, e))?;

    let probe = folder.join(format!(".burstdng-probe-{}", uuid::Uuid::new_v4()));
    std::fs::write(&probe, b"")
        .map_err(|e| InvalidInputError::output_not_writable(folder, e))?;
    if let Err(e) = std::fs::remove_file(&probe) {
        tracing::warn!(path = %probe.display(), error = %e, "Failed to remove write probe");
    }

    Ok(())
}

/// Fails if any task would write its output over one of the sources.
///
/// Paths are compared after resolving, so `./card` and `card` match.
fn reject_overwritten_inputs(tasks: &[ConversionTask]) -> Result<(), InvalidInputError> {
    let Some(first) = tasks.first() else {
        return Ok(());
    };
    let folder = std::fs::canonicalize(&first.destination_folder)
        .map_err(|e| InvalidInputError::output_not_writable(&first.destination_folder, e))?;
    let outputs: HashSet<PathBuf> = tasks
        .iter()
        .map(|task| folder.join(format!("{}.{}", task.output_base_name, DNG_EXTENSION)))
        .collect();

    for task in tasks {
        let resolved = std::fs::canonicalize(&task.source_path)
            .unwrap_or_else(|_| task.source_path.clone());
        if outputs.contains(&resolved) {
            return Err(InvalidInputError::InputIsOutput {
                path: task.source_path.clone(),
            });
        }
    }
    Ok(())
}

fn normalize_base_name(raw: &str) -> Result<String, InvalidInputError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(DEFAULT_BASE_NAME.to_string());
    }
    if trimmed.contains('/') || trimmed.contains('\\') {
        return Err(InvalidInputError::invalid_base_name(
            trimmed,
            "must not contain path separators",
        ));
    }
    if trimmed == "." || trimmed == ".." {
        return Err(InvalidInputError::invalid_base_name(
            trimmed,
            "must name a file",
        ));
    }
    Ok(trimmed.to_string())
}

fn collect_sources(request: &EnumerationRequest) -> Result<Vec<PathBuf>, InvalidInputError> {
    let mut seen = HashSet::new();
    let mut sources = Vec::new();

    for input in &request.inputs {
        let metadata = std::fs::metadata(input).map_err(|_| InvalidInputError::InputNotFound {
            path: input.clone(),
        })?;

        if metadata.is_dir() {
            for path in scan_dir(input, request)? {
                if seen.insert(path.clone()) {
                    sources.push(path);
                }
            }
        } else if seen.insert(input.clone()) {
            sources.push(input.clone());
        } else {
            tracing::debug!(path = %input.display(), "Skipping duplicate input");
        }
    }

    Ok(sources)
}

/// Raw files directly inside `dir`, sorted by file name.
fn scan_dir(dir: &Path, request: &EnumerationRequest) -> Result<Vec<PathBuf>, InvalidInputError> {
    let scan_error = |source| InvalidInputError::Scan {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(scan_error)? {
        let entry = entry.map_err(scan_error)?;
        let path = entry.path();
        if path.is_file() && request.accepts(&path) {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    tracing::debug!(dir = %dir.display(), found = files.len(), "Scanned input folder");
    Ok(files)
}
