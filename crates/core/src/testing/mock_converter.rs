//! Mock converter for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::converter::{ConversionOutput, Converter, ConverterError, ConverterInfo};
use crate::enumerator::ConversionTask;

/// Scripted behavior for one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOutcome {
    /// Exit 0 and report the output path.
    Succeed,
    /// Exit with the given code and output.
    Fail { exit_code: i32, output: String },
    /// Fail before the process starts.
    LaunchError,
    /// Panic inside `convert`.
    Panic,
}

/// Mock implementation of the Converter trait.
///
/// Provides controllable behavior for testing:
/// - Record dispatch order for assertions
/// - Script failures per sequence index
/// - Simulate conversion duration
/// - Track how many conversions run at once
///
/// # Example
///
/// ```rust,ignore
/// use burstdng_core::testing::{MockConverter, MockOutcome};
///
/// let converter = MockConverter::new();
/// converter.set_outcome(2, MockOutcome::Fail { exit_code: 1, output: "bad".into() }).await;
///
/// let runner = BatchRunner::new(converter.clone());
/// let report = runner.run(tasks, 2).await?.collect().await?;
///
/// assert!(converter.peak_in_flight() <= 2);
/// ```
#[derive(Debug, Clone)]
pub struct MockConverter {
    /// Tasks in the order `convert` was entered.
    invocations: Arc<RwLock<Vec<ConversionTask>>>,
    /// Scripted outcomes by sequence index.
    outcomes: Arc<RwLock<HashMap<usize, MockOutcome>>>,
    /// Per-task durations by sequence index.
    delays: Arc<RwLock<HashMap<usize, Duration>>>,
    /// Duration for tasks without an override.
    default_delay: Arc<RwLock<Duration>>,
    /// Conversions currently inside `convert`.
    in_flight: Arc<AtomicUsize>,
    /// Highest value `in_flight` reached.
    peak_in_flight: Arc<AtomicUsize>,
    /// Conversions that observed cancellation.
    cancelled: Arc<AtomicUsize>,
    /// Whether `validate` reports a missing executable.
    missing_executable: Arc<AtomicBool>,
}

impl Default for MockConverter {
    fn default() -> Self {
        Self::new()
    }
}

/// Decrements the in-flight counter even if `convert` panics.
struct InFlightGuard(Arc<AtomicUsize>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MockConverter {
    /// Create a new mock converter.
    pub fn new() -> Self {
        Self {
            invocations: Arc::new(RwLock::new(Vec::new())),
            outcomes: Arc::new(RwLock::new(HashMap::new())),
            delays: Arc::new(RwLock::new(HashMap::new())),
            default_delay: Arc::new(RwLock::new(Duration::from_millis(20))),
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak_in_flight: Arc::new(AtomicUsize::new(0)),
            cancelled: Arc::new(AtomicUsize::new(0)),
            missing_executable: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Script the outcome for a sequence index.
    pub async fn set_outcome(&self, sequence_index: usize, outcome: MockOutcome) {
        self.outcomes.write().await.insert(sequence_index, outcome);
    }

    /// Set the conversion duration for one sequence index.
    pub async fn set_delay_for(&self, sequence_index: usize, delay: Duration) {
        self.delays.write().await.insert(sequence_index, delay);
    }

    /// Set the default conversion duration.
    pub async fn set_conversion_duration(&self, delay: Duration) {
        *self.default_delay.write().await = delay;
    }

    /// Make `validate` fail as if the executable were missing.
    pub fn set_missing_executable(&self, missing: bool) {
        self.missing_executable.store(missing, Ordering::SeqCst);
    }

    /// Tasks in the order they were dispatched.
    pub async fn invocations(&self) -> Vec<ConversionTask> {
        self.invocations.read().await.clone()
    }

    /// Number of conversions started.
    pub async fn invocation_count(&self) -> usize {
        self.invocations.read().await.len()
    }

    /// Conversions running right now.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneous conversions seen.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    /// Conversions that were interrupted by cancellation.
    pub fn cancelled_count(&self) -> usize {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Converter for MockConverter {
    fn name(&self) -> &str {
        "mock"
    }

    async fn validate(&self) -> Result<ConverterInfo, ConverterError> {
        if self.missing_executable.load(Ordering::SeqCst) {
            return Err(ConverterError::ExecutableNotFound {
                path: PathBuf::from("mock-dnglab"),
            });
        }
        Ok(ConverterInfo {
            name: self.name().to_string(),
            executable: PathBuf::from("mock-dnglab"),
            version: Some("0.0.0-mock".to_string()),
        })
    }

    async fn convert(
        &self,
        task: &ConversionTask,
        cancel: CancellationToken,
    ) -> Result<ConversionOutput, ConverterError> {
        let start = Instant::now();
        self.invocations.write().await.push(task.clone());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlightGuard(Arc::clone(&self.in_flight));

        let delay = match self.delays.read().await.get(&task.sequence_index) {
            Some(delay) => *delay,
            None => *self.default_delay.read().await,
        };
        let outcome = self
            .outcomes
            .read()
            .await
            .get(&task.sequence_index)
            .cloned()
            .unwrap_or(MockOutcome::Succeed);

        if outcome == MockOutcome::LaunchError {
            return Err(ConverterError::ExecutableNotFound {
                path: PathBuf::from("mock-dnglab"),
            });
        }

        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                self.cancelled.fetch_add(1, Ordering::SeqCst);
                return Err(ConverterError::Cancelled {
                    output: format!("{}: interrupted", task.source_name()),
                });
            }
            () = tokio::time::sleep(delay) => {}
        }

        match outcome {
            MockOutcome::Succeed | MockOutcome::LaunchError => Ok(ConversionOutput {
                output_path: task.output_path(),
                exit_code: 0,
                output: format!("{} -> {}", task.source_name(), task.output_path().display()),
                duration_ms: start.elapsed().as_millis() as u64,
            }),
            MockOutcome::Fail { exit_code, output } => {
                Err(ConverterError::non_zero_exit(Some(exit_code), output))
            }
            MockOutcome::Panic => panic!("mock converter panic for task {}", task.sequence_index),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    #[tokio::test]
    async fn test_mock_success_records_invocation() {
        let converter = MockConverter::new();
        converter.set_conversion_duration(Duration::from_millis(1)).await;
        let task = fixtures::task(1, 1);

        let out = converter
            .convert(&task, CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(out.exit_code, 0);
        assert_eq!(converter.invocation_count().await, 1);
        assert_eq!(converter.peak_in_flight(), 1);
        assert_eq!(converter.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_mock_scripted_failure() {
        let converter = MockConverter::new();
        converter.set_conversion_duration(Duration::from_millis(1)).await;
        converter
            .set_outcome(
                1,
                MockOutcome::Fail {
                    exit_code: 3,
                    output: "corrupt".to_string(),
                },
            )
            .await;

        let err = converter
            .convert(&fixtures::task(1, 1), CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.exit_code(), Some(3));
        assert_eq!(err.captured_output(), Some("corrupt"));
    }

    #[tokio::test]
    async fn test_mock_cancellation() {
        let converter = MockConverter::new();
        converter.set_conversion_duration(Duration::from_secs(30)).await;
        let token = CancellationToken::new();

        let c = converter.clone();
        let t = token.clone();
        let handle = tokio::spawn(async move { c.convert(&fixtures::task(1, 1), t).await });

        tokio::time::sleep(Duration::from_millis(20)).await;
        token.cancel();
        let err = handle.await.unwrap().unwrap_err();
        assert!(matches!(err, ConverterError::Cancelled { .. }));
        assert_eq!(converter.cancelled_count(), 1);
    }

    #[test]
    fn test_mock_validate_missing() {
        let converter = MockConverter::new();
        let info = tokio_test::assert_ok!(tokio_test::block_on(converter.validate()));
        assert_eq!(info.name, "mock");

        converter.set_missing_executable(true);
        let err = tokio_test::assert_err!(tokio_test::block_on(converter.validate()));
        assert!(matches!(err, ConverterError::ExecutableNotFound { .. }));
    }
}
