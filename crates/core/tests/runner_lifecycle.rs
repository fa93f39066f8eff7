//! Batch runner lifecycle tests.
//!
//! These drive the full dispatch loop against the mock converter, covering
//! bounded concurrency, partial failure and cancellation.

use std::time::Duration;

use burstdng_core::testing::{fixtures, MockConverter, MockOutcome};
use burstdng_core::{
    enumerate, BatchRunner, EnumerationRequest, InvalidInputError, JobStatus, RunEvent,
};
use tempfile::TempDir;

fn quick_converter() -> MockConverter {
    MockConverter::new()
}

// =============================================================================
// Bounded concurrency
// =============================================================================

#[tokio::test]
async fn test_five_tasks_two_slots_all_succeed() {
    let converter = quick_converter();
    converter
        .set_conversion_duration(Duration::from_millis(30))
        .await;
    let runner = BatchRunner::new(converter.clone());

    let handle = runner.run(fixtures::tasks(5, "/out"), 2).await.unwrap();
    let report = handle.collect().await.unwrap();

    assert_eq!(report.results.len(), 5);
    assert!(report.results.iter().all(|r| r.status == JobStatus::Success));
    assert_eq!(report.summary.succeeded, 5);
    assert_eq!(report.summary.failed, 0);
    assert!(!report.summary.was_cancelled);
    assert!(converter.peak_in_flight() <= 2);
    assert_eq!(converter.invocation_count().await, 5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrency_never_exceeds_limit() {
    let converter = quick_converter();
    converter
        .set_conversion_duration(Duration::from_millis(15))
        .await;
    converter.set_delay_for(3, Duration::from_millis(60)).await;
    converter.set_delay_for(7, Duration::from_millis(45)).await;
    let runner = BatchRunner::new(converter.clone());

    let handle = runner.run(fixtures::tasks(12, "/out"), 3).await.unwrap();
    let report = handle.collect().await.unwrap();

    assert_eq!(report.results.len(), 12);
    assert!(converter.peak_in_flight() <= 3);
    assert!(converter.peak_in_flight() >= 1);
    assert_eq!(converter.in_flight(), 0);
}

#[tokio::test]
async fn test_single_slot_runs_sequentially() {
    let converter = quick_converter();
    converter
        .set_conversion_duration(Duration::from_millis(5))
        .await;
    let runner = BatchRunner::new(converter.clone());

    let report = runner
        .run(fixtures::tasks(4, "/out"), 1)
        .await
        .unwrap()
        .collect()
        .await
        .unwrap();

    assert_eq!(report.summary.succeeded, 4);
    assert_eq!(converter.peak_in_flight(), 1);
    let order: Vec<usize> = converter
        .invocations()
        .await
        .iter()
        .map(|t| t.sequence_index)
        .collect();
    assert_eq!(order, vec![1, 2, 3, 4]);
}

#[tokio::test]
async fn test_more_slots_than_tasks() {
    let converter = quick_converter();
    let runner = BatchRunner::new(converter.clone());

    let report = runner
        .run(fixtures::tasks(2, "/out"), 8)
        .await
        .unwrap()
        .collect()
        .await
        .unwrap();

    assert_eq!(report.summary.succeeded, 2);
    assert!(converter.peak_in_flight() <= 2);
}

// =============================================================================
// Dispatch order and events
// =============================================================================

#[tokio::test]
async fn test_tasks_start_in_enumeration_order() {
    let converter = quick_converter();
    converter.set_delay_for(1, Duration::from_millis(80)).await;
    converter
        .set_conversion_duration(Duration::from_millis(5))
        .await;
    let runner = BatchRunner::new(converter);

    let mut handle = runner.run(fixtures::tasks(6, "/out"), 2).await.unwrap();

    let mut started = Vec::new();
    let mut finished = Vec::new();
    let mut first = None;
    let mut last = None;
    while let Some(event) = handle.recv().await {
        if first.is_none() {
            first = Some(event.clone());
        }
        match &event {
            RunEvent::TaskStarted { sequence_index, .. } => started.push(*sequence_index),
            RunEvent::TaskFinished { result } => finished.push(result.sequence_index()),
            _ => {}
        }
        last = Some(event);
    }

    assert_eq!(started, vec![1, 2, 3, 4, 5, 6]);
    assert_eq!(finished.len(), 6);
    // Task 1 is slow, so it cannot be the first to finish.
    assert_ne!(finished[0], 1);
    assert!(matches!(
        first,
        Some(RunEvent::BatchStarted {
            total_tasks: 6,
            max_concurrent: 2,
            ..
        })
    ));
    match last {
        Some(RunEvent::BatchFinished { summary }) => {
            assert_eq!(summary.total, 6);
            assert_eq!(summary.succeeded, 6);
        }
        other => panic!("expected BatchFinished last, got {:?}", other),
    }
}

#[tokio::test]
async fn test_results_carry_their_task() {
    let converter = quick_converter();
    let runner = BatchRunner::new(converter);
    let tasks = fixtures::tasks(3, "/out");

    let report = runner
        .run(tasks.clone(), 3)
        .await
        .unwrap()
        .collect()
        .await
        .unwrap();

    for (result, task) in report.results.iter().zip(tasks.iter()) {
        assert_eq!(&result.task, task);
    }
    assert_eq!(
        report.results[2].task.output_path(),
        std::path::PathBuf::from("/out/burst-003.dng")
    );
}

#[tokio::test]
async fn test_status_reports_idle_pool_after_run() {
    let converter = quick_converter();
    converter.set_outcome(2, MockOutcome::LaunchError).await;
    let runner = BatchRunner::new(converter);

    let mut handle = runner.run(fixtures::tasks(3, "/out"), 2).await.unwrap();
    while handle.recv().await.is_some() {}

    let status = handle.status();
    assert_eq!(status.active_jobs, 0);
    assert_eq!(status.queued_jobs, 0);
    assert_eq!(status.total_processed, 3);
    assert_eq!(status.total_failed, 1);
    assert_eq!(status.max_concurrent, 2);
    assert!(status.peak_active_jobs <= 2);
}

// =============================================================================
// Partial failure
// =============================================================================

#[tokio::test]
async fn test_one_failure_does_not_stop_batch() {
    let converter = quick_converter();
    converter
        .set_outcome(
            2,
            MockOutcome::Fail {
                exit_code: 1,
                output: "Error: unsupported camera model".to_string(),
            },
        )
        .await;
    let runner = BatchRunner::new(converter.clone());

    let report = runner
        .run(fixtures::tasks(3, "/out"), 2)
        .await
        .unwrap()
        .collect()
        .await
        .unwrap();

    let statuses: Vec<JobStatus> = report.results.iter().map(|r| r.status).collect();
    assert_eq!(
        statuses,
        vec![JobStatus::Success, JobStatus::Failed, JobStatus::Success]
    );

    let failed = &report.results[1];
    assert_eq!(failed.exit_code, Some(1));
    assert!(failed
        .captured_output
        .contains("unsupported camera model"));
    assert!(failed.error.is_some());

    assert_eq!(report.summary.succeeded, 2);
    assert_eq!(report.summary.failed, 1);
    assert!(!report.summary.all_succeeded());
    assert_eq!(converter.invocation_count().await, 3);
}

#[tokio::test]
async fn test_launch_errors_are_per_task() {
    let converter = quick_converter();
    converter.set_outcome(1, MockOutcome::LaunchError).await;
    converter.set_outcome(3, MockOutcome::LaunchError).await;
    let runner = BatchRunner::new(converter);

    let report = runner
        .run(fixtures::tasks(4, "/out"), 2)
        .await
        .unwrap()
        .collect()
        .await
        .unwrap();

    assert_eq!(report.summary.failed, 2);
    assert_eq!(report.summary.succeeded, 2);
    assert_eq!(report.results[0].exit_code, None);
    assert_eq!(report.results[0].status, JobStatus::Failed);
}

// =============================================================================
// Input validation
// =============================================================================

#[tokio::test]
async fn test_empty_selection_dispatches_nothing() {
    let converter = quick_converter();
    let runner = BatchRunner::new(converter.clone());
    let out = TempDir::new().unwrap();

    let request = EnumerationRequest::new(Vec::new(), out.path(), "burst");
    let err = enumerate(&request).unwrap_err();
    assert!(matches!(err, InvalidInputError::EmptyInput));

    let err = runner.run(Vec::new(), 2).await.unwrap_err();
    assert!(matches!(err, InvalidInputError::EmptyInput));
    assert_eq!(converter.invocation_count().await, 0);
}

#[tokio::test]
async fn test_missing_executable_is_reported_up_front() {
    let converter = quick_converter();
    converter.set_missing_executable(true);
    let runner = BatchRunner::new(converter.clone());

    let err = runner
        .run(fixtures::tasks(3, "/out"), 2)
        .await
        .unwrap_err();

    assert!(matches!(err, InvalidInputError::ExecutableNotFound { .. }));
    assert_eq!(converter.invocation_count().await, 0);
}

// =============================================================================
// Cancellation
// =============================================================================

#[tokio::test]
async fn test_cancel_with_two_running_and_three_pending() {
    let converter = quick_converter();
    converter
        .set_conversion_duration(Duration::from_secs(30))
        .await;
    let runner = BatchRunner::new(converter.clone());

    let mut handle = runner.run(fixtures::tasks(5, "/out"), 2).await.unwrap();

    let mut started = 0;
    while started < 2 {
        match handle.recv().await {
            Some(RunEvent::TaskStarted { .. }) => started += 1,
            Some(_) => {}
            None => panic!("batch ended before two tasks started"),
        }
    }

    handle.cancel();
    assert!(handle.is_cancelled());

    let report = tokio::time::timeout(Duration::from_secs(5), handle.collect())
        .await
        .expect("cancelled batch should finish promptly")
        .unwrap();

    assert_eq!(report.results.len(), 5);
    let statuses: Vec<JobStatus> = report.results.iter().map(|r| r.status).collect();
    assert_eq!(
        statuses,
        vec![
            JobStatus::Failed,
            JobStatus::Failed,
            JobStatus::Cancelled,
            JobStatus::Cancelled,
            JobStatus::Cancelled,
        ]
    );
    assert!(report.results[0]
        .error
        .as_deref()
        .unwrap()
        .contains("cancel"));

    assert!(report.summary.was_cancelled);
    assert_eq!(report.summary.failed, 2);
    assert_eq!(report.summary.cancelled, 3);
    assert_eq!(report.summary.reported(), 5);

    assert_eq!(converter.invocation_count().await, 2);
    assert_eq!(converter.cancelled_count(), 2);
    assert_eq!(converter.in_flight(), 0);
}

#[tokio::test]
async fn test_cancel_after_completion_changes_nothing() {
    let converter = quick_converter();
    let runner = BatchRunner::new(converter);

    let mut handle = runner.run(fixtures::tasks(2, "/out"), 2).await.unwrap();
    let token = handle.cancellation_token();

    let mut results = Vec::new();
    while let Some(event) = handle.recv().await {
        if let RunEvent::TaskFinished { result } = event {
            results.push(result);
        }
    }
    token.cancel();

    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.is_success()));
    let summary = handle.wait().await.unwrap();
    assert!(!summary.was_cancelled);
    assert_eq!(summary.succeeded, 2);
}

#[tokio::test]
async fn test_cancel_before_first_slot_frees() {
    let converter = quick_converter();
    converter
        .set_conversion_duration(Duration::from_secs(30))
        .await;
    let runner = BatchRunner::new(converter.clone());

    let mut handle = runner.run(fixtures::tasks(3, "/out"), 1).await.unwrap();
    loop {
        match handle.recv().await {
            Some(RunEvent::TaskStarted { .. }) => break,
            Some(_) => {}
            None => panic!("batch ended early"),
        }
    }
    handle.cancel();

    let report = handle.collect().await.unwrap();
    assert_eq!(report.summary.failed, 1);
    assert_eq!(report.summary.cancelled, 2);
    assert_eq!(converter.invocation_count().await, 1);
}

// =============================================================================
// Enumerate then run
// =============================================================================

#[tokio::test]
async fn test_enumerated_tasks_run_to_completion() {
    let input = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    for name in ["IMG_0003.CR3", "IMG_0001.CR3", "IMG_0002.cr3", "notes.txt"] {
        std::fs::write(input.path().join(name), b"raw").unwrap();
    }

    let request = EnumerationRequest::new(vec![input.path().to_path_buf()], out.path(), "burst");
    let tasks = enumerate(&request).unwrap();
    assert_eq!(tasks.len(), 3);

    let converter = quick_converter();
    let runner = BatchRunner::new(converter.clone());
    let report = runner
        .run(tasks, 2)
        .await
        .unwrap()
        .collect()
        .await
        .unwrap();

    assert_eq!(report.summary.succeeded, 3);
    let names: Vec<String> = report
        .results
        .iter()
        .map(|r| {
            r.task
                .output_path()
                .file_name()
                .unwrap()
                .to_string_lossy()
                .to_string()
        })
        .collect();
    assert_eq!(names, vec!["burst-001.dng", "burst-002.dng", "burst-003.dng"]);
    assert!(report.results[0]
        .task
        .source_path
        .ends_with("IMG_0001.CR3"));
}
