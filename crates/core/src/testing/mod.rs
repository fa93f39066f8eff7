//! Testing utilities and mock implementations.
//!
//! This module provides a mock converter so the runner can be exercised
//! without a real dnglab binary.
//!
//! # Example
//!
//! ```rust,ignore
//! use burstdng_core::testing::{fixtures, MockConverter};
//!
//! let converter = MockConverter::new();
//! let tasks = fixtures::tasks(5, "/out");
//! ```

mod mock_converter;

pub use mock_converter::{MockConverter, MockOutcome};

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::path::{Path, PathBuf};

    use crate::enumerator::{output_base_name, ConversionTask};

    /// Create the `index`-th (1-based) of `total` tasks writing to `/out`.
    pub fn task(index: usize, total: usize) -> ConversionTask {
        task_in(index, total, Path::new("/out"))
    }

    /// Create the `index`-th (1-based) of `total` tasks writing to `dest`.
    pub fn task_in(index: usize, total: usize, dest: &Path) -> ConversionTask {
        ConversionTask {
            sequence_index: index,
            source_path: PathBuf::from(format!("/card/DCIM/IMG_{:04}.CR3", index)),
            destination_folder: dest.to_path_buf(),
            output_base_name: output_base_name("burst", index, total),
        }
    }

    /// Create `count` consecutive tasks writing to `dest`.
    pub fn tasks(count: usize, dest: impl AsRef<Path>) -> Vec<ConversionTask> {
        (1..=count)
            .map(|i| task_in(i, count, dest.as_ref()))
            .collect()
    }
}
