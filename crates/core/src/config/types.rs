use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Persisted run preferences.
///
/// Read once when a run starts and handed to the enumerator and runner
/// explicitly; nothing in the core reads preferences from global state.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Preferences {
    /// Converter executable, either an absolute path or a command on PATH.
    #[serde(default = "default_executable_path")]
    pub executable_path: PathBuf,
    /// Folder used when a run does not name one.
    #[serde(default = "default_output_folder")]
    pub default_output_folder: PathBuf,
    /// Upper bound on simultaneously running converter processes.
    #[serde(default = "default_max_concurrent_jobs")]
    pub max_concurrent_jobs: usize,
    /// Per-conversion timeout in seconds. Unset means no timeout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            executable_path: default_executable_path(),
            default_output_folder: default_output_folder(),
            max_concurrent_jobs: default_max_concurrent_jobs(),
            timeout_secs: None,
        }
    }
}

fn default_executable_path() -> PathBuf {
    PathBuf::from("dnglab")
}

fn default_output_folder() -> PathBuf {
    directories::UserDirs::new()
        .and_then(|dirs| {
            dirs.desktop_dir()
                .map(|d| d.to_path_buf())
                .or_else(|| Some(dirs.home_dir().to_path_buf()))
        })
        .unwrap_or_else(|| PathBuf::from("."))
}

fn default_max_concurrent_jobs() -> usize {
    2
}

impl Preferences {
    /// Sets the converter executable.
    pub fn with_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.executable_path = path.into();
        self
    }

    /// Sets the default output folder.
    pub fn with_output_folder(mut self, path: impl Into<PathBuf>) -> Self {
        self.default_output_folder = path.into();
        self
    }

    /// Sets the concurrency limit.
    pub fn with_max_concurrent_jobs(mut self, max: usize) -> Self {
        self.max_concurrent_jobs = max;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let prefs = Preferences::default();
        assert_eq!(prefs.executable_path, PathBuf::from("dnglab"));
        assert_eq!(prefs.max_concurrent_jobs, 2);
        assert!(prefs.timeout_secs.is_none());
    }

    #[test]
    fn test_deserialize_partial() {
        let toml = r#"
max_concurrent_jobs = 6
"#;
        let prefs: Preferences = toml::from_str(toml).unwrap();
        assert_eq!(prefs.max_concurrent_jobs, 6);
        assert_eq!(prefs.executable_path, PathBuf::from("dnglab"));
    }

    #[test]
    fn test_deserialize_full() {
        let toml = r#"
executable_path = "/opt/dnglab/bin/dnglab"
default_output_folder = "/photos/dng"
max_concurrent_jobs = 3
timeout_secs = 120
"#;
        let prefs: Preferences = toml::from_str(toml).unwrap();
        assert_eq!(prefs.executable_path, PathBuf::from("/opt/dnglab/bin/dnglab"));
        assert_eq!(prefs.default_output_folder, PathBuf::from("/photos/dng"));
        assert_eq!(prefs.max_concurrent_jobs, 3);
        assert_eq!(prefs.timeout_secs, Some(120));
    }

    #[test]
    fn test_builder() {
        let prefs = Preferences::default()
            .with_executable("/usr/local/bin/dnglab")
            .with_output_folder("/tmp/out")
            .with_max_concurrent_jobs(4);
        assert_eq!(prefs.executable_path, PathBuf::from("/usr/local/bin/dnglab"));
        assert_eq!(prefs.default_output_folder, PathBuf::from("/tmp/out"));
        assert_eq!(prefs.max_concurrent_jobs, 4);
    }
}
