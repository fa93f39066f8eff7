//! Converter module: the process boundary to the external raw-to-DNG tool.
//!
//! This module provides the `Converter` trait and the DNGLab implementation.
//! A converter turns one [`ConversionTask`](crate::enumerator::ConversionTask)
//! into one DNG by spawning an external process, capturing its output, and
//! killing it on cancellation or timeout.
//!
//! # Example
//!
//! ```ignore
//! use burstdng_core::converter::{Converter, ConverterConfig, DngLabConverter};
//! use tokio_util::sync::CancellationToken;
//!
//! let converter = DngLabConverter::new(ConverterConfig::with_executable("dnglab"));
//!
//! // Validate dnglab is available
//! let info = converter.validate().await?;
//! println!("Using {} {:?}", info.executable.display(), info.version);
//!
//! let output = converter.convert(&task, CancellationToken::new()).await?;
//! println!("Converted in {} ms", output.duration_ms);
//! ```

mod config;
mod dnglab;
mod error;
mod traits;
mod types;

pub use config::ConverterConfig;
pub use dnglab::DngLabConverter;
pub use error::ConverterError;
pub use traits::Converter;
pub use types::{ConversionOutput, ConverterInfo};
