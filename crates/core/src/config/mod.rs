mod loader;
mod types;
mod validate;

pub use loader::{
    default_preferences_path, load_preferences, load_preferences_from_str, save_preferences,
    PREFS_PATH_ENV,
};
pub use types::*;
pub use validate::validate_preferences;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse preferences: {0}")]
    ParseError(String),

    #[error("Preferences validation failed: {0}")]
    ValidationError(String),

    #[error("Failed to write preferences to {path}: {reason}")]
    WriteError { path: String, reason: String },
}
