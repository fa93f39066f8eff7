use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::{Path, PathBuf};

use super::{types::Preferences, ConfigError};

/// Environment variable overriding the preferences file location.
pub const PREFS_PATH_ENV: &str = "BURSTDNG_PREFS";

/// Location of the preferences file.
///
/// `BURSTDNG_PREFS` wins; otherwise the per-user config directory, falling back
/// to a dotfile in the working directory when no home is known.
pub fn default_preferences_path() -> PathBuf {
    if let Ok(path) = std::env::var(PREFS_PATH_ENV) {
        return PathBuf::from(path);
    }

    directories::ProjectDirs::from("", "", "burstdng")
        .map(|dirs| dirs.config_dir().join("preferences.toml"))
        .unwrap_or_else(|| PathBuf::from(".burstdng.toml"))
}

/// Load preferences: defaults, then the TOML file if present, then `BURSTDNG_*`
/// environment overrides.
pub fn load_preferences(path: &Path) -> Result<Preferences, ConfigError> {
    let prefs: Preferences = Figment::new()
        .merge(Serialized::defaults(Preferences::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("BURSTDNG_").ignore(&["prefs"]))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(prefs)
}

/// Load preferences from TOML string (useful for testing)
pub fn load_preferences_from_str(toml_str: &str) -> Result<Preferences, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Persist preferences as TOML, creating the parent directory.
pub fn save_preferences(path: &Path, prefs: &Preferences) -> Result<(), ConfigError> {
    let write_error = |reason: String| ConfigError::WriteError {
        path: path.display().to_string(),
        reason,
    };

    let body = toml::to_string_pretty(prefs).map_err(|e| write_error(e.to_string()))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| write_error(e.to_string()))?;
    }
    std::fs::write(path, body).map_err(|e| write_error(e.to_string()))?;

    tracing::debug!(path = %path.display(), "Saved preferences");
    Ok(())
}
