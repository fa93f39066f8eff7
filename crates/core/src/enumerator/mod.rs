//! Job enumerator: turns selected burst files and folders into an ordered
//! list of conversion tasks.
//!
//! Folders are scanned one level deep for files with a recognized raw
//! extension. When more than one task results, every output name carries a
//! zero-padded sequence suffix so burst frames never collide.
//!
//! # Example
//!
//! ```ignore
//! use burstdng_core::enumerator::{enumerate, EnumerationRequest};
//!
//! let request = EnumerationRequest::new(
//!     vec![PathBuf::from("/card/DCIM/100CANON")],
//!     PathBuf::from("/photos/dng"),
//!     "burst",
//! );
//! let tasks = enumerate(&request)?;
//! // burst-001.dng, burst-002.dng, ...
//! ```

mod scan;
mod types;

pub use scan::{enumerate, output_base_name, probe_writable};
pub use types::{ConversionTask, EnumerationRequest, DEFAULT_BASE_NAME, DNG_EXTENSION, RAW_EXTENSIONS};
