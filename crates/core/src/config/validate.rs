use super::{types::Preferences, ConfigError};

/// Validate preferences
/// Currently validates:
/// - Executable path is not empty
/// - max_concurrent_jobs is at least 1
pub fn validate_preferences(prefs: &Preferences) -> Result<(), ConfigError> {
    if prefs.executable_path.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "executable_path cannot be empty".to_string(),
        ));
    }

    if prefs.max_concurrent_jobs == 0 {
        return Err(ConfigError::ValidationError(
            "max_concurrent_jobs must be at least 1".to_string(),
        ));
    }

    if prefs.timeout_secs == Some(0) {
        return Err(ConfigError::ValidationError(
            "timeout_secs cannot be 0; leave it unset for no timeout".to_string(),
        ));
    }

    Ok(())
}
