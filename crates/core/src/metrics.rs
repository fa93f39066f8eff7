//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Conversion jobs (results, durations)
//! - Converter process slots (active processes)
//! - Batches (completed, cancelled)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts};

use crate::runner::{BatchSummary, JobResult};

// =============================================================================
// Jobs
// =============================================================================

/// Conversion jobs total by result.
pub static JOBS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("burstdng_jobs_total", "Total conversion jobs by result"),
        &["result"], // "success", "failed", "cancelled"
    )
    .unwrap()
});

/// Conversion job duration in seconds.
pub static JOB_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "burstdng_job_duration_seconds",
            "Duration of a single converter process",
        )
        .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0]),
        &["result"],
    )
    .unwrap()
});

/// Converter processes currently running.
pub static ACTIVE_PROCESSES: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "burstdng_active_processes",
        "Number of converter processes currently running",
    )
    .unwrap()
});

// =============================================================================
// Batches
// =============================================================================

/// Batches total by outcome.
pub static BATCHES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("burstdng_batches_total", "Total batches by outcome"),
        &["outcome"], // "completed", "cancelled"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(JOBS_TOTAL.clone()),
        Box::new(JOB_DURATION.clone()),
        Box::new(ACTIVE_PROCESSES.clone()),
        Box::new(BATCHES_TOTAL.clone()),
    ]
}

/// Record a finished job.
pub fn record_job(result: &JobResult) {
    let label = result.status.as_str();
    JOBS_TOTAL.with_label_values(&[label]).inc();
    if result.status.was_run() {
        JOB_DURATION
            .with_label_values(&[label])
            .observe(result.duration_ms as f64 / 1000.0);
    }
}

/// Record a finished batch.
pub fn record_batch(summary: &BatchSummary) {
    let outcome = if summary.was_cancelled {
        "cancelled"
    } else {
        "completed"
    };
    BATCHES_TOTAL.with_label_values(&[outcome]).inc();
}
