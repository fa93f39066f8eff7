//! Prometheus metrics export.
//!
//! The CLI is short-lived, so instead of serving `/metrics` it dumps the
//! registry in text exposition format when a run ends.

use once_cell::sync::Lazy;
use prometheus::{Encoder, Registry, TextEncoder};
use std::path::Path;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

fn register_metrics(registry: &Registry) {
    for metric in burstdng_core::metrics::all_metrics() {
        if let Err(e) = registry.register(metric) {
            tracing::warn!(error = %e, "Failed to register metric");
        }
    }
}

/// Encode all metrics in Prometheus text format.
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// Write the metrics dump to `path`.
pub fn write_metrics(path: &Path) -> anyhow::Result<()> {
    let body = encode_metrics()?;
    std::fs::write(path, body)?;
    tracing::debug!(path = %path.display(), "Wrote metrics");
    Ok(())
}
