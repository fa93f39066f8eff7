pub mod config;
pub mod converter;
pub mod enumerator;
pub mod error;
pub mod metrics;
pub mod runner;
pub mod testing;

pub use config::{
    default_preferences_path, load_preferences, load_preferences_from_str, save_preferences,
    validate_preferences, ConfigError, Preferences, PREFS_PATH_ENV,
};
pub use converter::{
    ConversionOutput, Converter, ConverterConfig, ConverterError, ConverterInfo, DngLabConverter,
};
pub use enumerator::{enumerate, ConversionTask, EnumerationRequest};
pub use error::InvalidInputError;
pub use runner::{
    BatchReport, BatchRunner, BatchSummary, JobResult, JobStatus, PoolStatus, RunEvent,
    RunHandle, RunnerConfig, RunnerError,
};
