//! DNGLab-based converter implementation.

use async_trait::async_trait;
use regex_lite::Regex;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tokio::time::{timeout, Duration};
use tokio_util::sync::CancellationToken;

use crate::enumerator::ConversionTask;

use super::config::ConverterConfig;
use super::error::ConverterError;
use super::traits::Converter;
use super::types::{join_output, ConversionOutput, ConverterInfo};

/// How long `--version` may take during validation.
const VERSION_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// How long output is still read once dnglab itself has exited.
const OUTPUT_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// DNGLab-based converter implementation.
///
/// Each conversion runs
/// `dnglab convert --image-index <idx> --embed-raw <bool> <input> <output>`.
pub struct DngLabConverter {
    config: ConverterConfig,
}

enum Outcome {
    Exited(std::io::Result<ExitStatus>),
    Cancelled,
    TimedOut(u64),
}

impl DngLabConverter {
    /// Creates a new DNGLab converter with the given configuration.
    pub fn new(config: ConverterConfig) -> Self {
        Self { config }
    }

    /// Creates a converter with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(ConverterConfig::default())
    }

    /// Returns the converter configuration.
    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    /// Builds dnglab arguments for one conversion.
    ///
    /// Paths are passed through as OS strings, untouched.
    pub fn build_args(&self, input_path: &Path, output_path: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "convert".into(),
            "--image-index".into(),
            self.config.image_index.clone().into(),
            "--embed-raw".into(),
            (if self.config.embed_raw { "true" } else { "false" }).into(),
        ];

        args.extend(self.config.extra_args.iter().map(OsString::from));

        args.push(input_path.as_os_str().to_os_string());
        args.push(output_path.as_os_str().to_os_string());
        args
    }

    /// Resolves the configured executable to a runnable file.
    ///
    /// Absolute and relative paths are checked in place; bare names are looked
    /// up on PATH.
    pub fn resolve_executable(&self) -> Result<PathBuf, ConverterError> {
        which::which(&self.config.executable_path).map_err(|e| {
            tracing::debug!(
                executable = %self.config.executable_path.display(),
                error = %e,
                "Executable lookup failed"
            );
            ConverterError::ExecutableNotFound {
                path: self.config.executable_path.clone(),
            }
        })
    }

    /// Extracts a version number from `--version` output.
    fn parse_version(output: &str) -> Option<String> {
        let re = Regex::new(r"\d+\.\d+(?:\.\d+)?(?:[-+][0-9A-Za-z.\-]+)?").ok()?;
        re.find(output).map(|m| m.as_str().to_string())
    }

    async fn probe_version(executable: &Path) -> Option<String> {
        let run = Command::new(executable)
            .arg("--version")
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        match timeout(VERSION_PROBE_TIMEOUT, run).await {
            Ok(Ok(output)) => {
                let text = join_output(
                    &String::from_utf8_lossy(&output.stdout),
                    &String::from_utf8_lossy(&output.stderr),
                );
                Self::parse_version(&text)
            }
            Ok(Err(e)) => {
                tracing::debug!(error = %e, "Version probe failed");
                None
            }
            Err(_) => {
                tracing::debug!("Version probe timed out");
                None
            }
        }
    }

    /// Removes an unfinished output, unless it was already there before
    /// this conversion started.
    async fn discard_partial(&self, output_path: &Path, preexisting: bool) {
        if !self.config.remove_partial_output {
            return;
        }
        if preexisting {
            tracing::debug!(
                path = %output_path.display(),
                "Keeping output that predates this conversion"
            );
            return;
        }
        match tokio::fs::remove_file(output_path).await {
            Ok(()) => {
                tracing::debug!(path = %output_path.display(), "Removed partial output");
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(
                    path = %output_path.display(),
                    error = %e,
                    "Failed to remove partial output"
                );
            }
        }
    }
}

/// Output read so far from one pipe.
#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn append(&self, bytes: &[u8]) {
        self.0
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .extend_from_slice(bytes);
    }

    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap_or_else(|e| e.into_inner())).into_owned()
    }
}

/// Copies `pipe` into `captured` until EOF.
///
/// Output lands in `captured` as it arrives, so aborting the reader keeps
/// whatever was read.
fn capture<R>(pipe: Option<R>, captured: Captured) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let Some(mut pipe) = pipe else {
            return;
        };
        let mut chunk = [0u8; 8192];
        loop {
            match pipe.read(&mut chunk).await {
                Ok(0) => break,
                Ok(n) => captured.append(&chunk[..n]),
                Err(e) => {
                    tracing::debug!(error = %e, "Failed reading converter output");
                    break;
                }
            }
        }
    })
}

/// Waits for both readers, giving up after [`OUTPUT_DRAIN_TIMEOUT`].
///
/// A grandchild that escaped the kill can hold the pipes open forever.
async fn drain(index: usize, mut readers: [JoinHandle<()>; 2]) {
    let finished = timeout(OUTPUT_DRAIN_TIMEOUT, async {
        for reader in readers.iter_mut() {
            let _ = reader.await;
        }
    })
    .await;

    if finished.is_err() {
        tracing::warn!(index, "dnglab output still open after exit, abandoning it");
        for reader in &readers {
            reader.abort();
        }
    }
}

/// Kills dnglab together with anything it started.
///
/// The child leads its own process group, so on Unix the whole group is
/// signalled before the child itself is reaped.
async fn terminate(child: &mut Child) -> std::io::Result<()> {
    #[cfg(unix)]
    if let Some(pid) = child.id() {
        // SAFETY: killpg only sends a signal; the group id is the child's
        // pid, set at spawn through process_group(0).
        let rc = unsafe { libc::killpg(pid as libc::pid_t, libc::SIGKILL) };
        if rc != 0 {
            tracing::debug!(
                pid,
                error = %std::io::Error::last_os_error(),
                "Failed to signal dnglab process group"
            );
        }
    }
    child.kill().await
}

async fn deadline(limit: Option<u64>) -> u64 {
    match limit {
        Some(secs) => {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            secs
        }
        None => std::future::pending().await,
    }
}

#[async_trait]
impl Converter for DngLabConverter {
    fn name(&self) -> &str {
        "dnglab"
    }

    async fn validate(&self) -> Result<ConverterInfo, ConverterError> {
        let executable = self.resolve_executable()?;
        let version = Self::probe_version(&executable).await;

        tracing::info!(
            executable = %executable.display(),
            version = version.as_deref().unwrap_or("unknown"),
            "dnglab validated"
        );

        Ok(ConverterInfo {
            name: self.name().to_string(),
            executable,
            version,
        })
    }

    async fn convert(
        &self,
        task: &ConversionTask,
        cancel: CancellationToken,
    ) -> Result<ConversionOutput, ConverterError> {
        let start = Instant::now();
        let output_path = task.output_path();

        if cancel.is_cancelled() {
            tracing::debug!(index = task.sequence_index, "Cancelled before spawning dnglab");
            return Err(ConverterError::Cancelled {
                output: String::new(),
            });
        }

        tokio::fs::create_dir_all(&task.destination_folder)
            .await
            .map_err(|_| ConverterError::OutputDirectoryFailed {
                path: task.destination_folder.clone(),
            })?;

        let args = self.build_args(&task.source_path, &output_path);
        tracing::debug!(
            index = task.sequence_index,
            executable = %self.config.executable_path.display(),
            ?args,
            "Spawning dnglab"
        );

        let preexisting = tokio::fs::try_exists(&output_path).await.unwrap_or(false);

        let mut command = Command::new(&self.config.executable_path);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);

        let mut child = command
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ConverterError::ExecutableNotFound {
                        path: self.config.executable_path.clone(),
                    }
                } else {
                    ConverterError::Launch {
                        path: self.config.executable_path.clone(),
                        source: e,
                    }
                }
            })?;

        let stdout = Captured::default();
        let stderr = Captured::default();
        let readers = [
            capture(child.stdout.take(), stdout.clone()),
            capture(child.stderr.take(), stderr.clone()),
        ];

        let outcome = tokio::select! {
            biased;
            () = cancel.cancelled() => Outcome::Cancelled,
            status = child.wait() => Outcome::Exited(status),
            secs = deadline(self.config.timeout_secs) => Outcome::TimedOut(secs),
        };

        if matches!(outcome, Outcome::Cancelled | Outcome::TimedOut(_)) {
            if let Err(e) = terminate(&mut child).await {
                tracing::warn!(index = task.sequence_index, error = %e, "Failed to kill dnglab");
            }
        }

        drain(task.sequence_index, readers).await;
        let output = join_output(&stdout.text(), &stderr.text());
        let duration_ms = start.elapsed().as_millis() as u64;

        match outcome {
            Outcome::Exited(Ok(status)) if status.success() => {
                if !tokio::fs::try_exists(&output_path).await.unwrap_or(false) {
                    return Err(ConverterError::MissingOutput {
                        path: output_path,
                        output,
                    });
                }
                Ok(ConversionOutput {
                    output_path,
                    exit_code: 0,
                    output,
                    duration_ms,
                })
            }
            Outcome::Exited(Ok(status)) => Err(ConverterError::non_zero_exit(status.code(), output)),
            Outcome::Exited(Err(e)) => Err(ConverterError::Io(e)),
            Outcome::Cancelled => {
                self.discard_partial(&output_path, preexisting).await;
                Err(ConverterError::Cancelled { output })
            }
            Outcome::TimedOut(timeout_secs) => {
                self.discard_partial(&output_path, preexisting).await;
                Err(ConverterError::Timeout {
                    timeout_secs,
                    output,
                })
            }
        }
    }
}
