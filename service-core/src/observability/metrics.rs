//! Metrics collection and Prometheus export.
//!
//! Installs the global `metrics` recorder and renders the `/metrics` exposition.

use crate::error::AppError;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

/// Global handle to the Prometheus recorder.
static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder.
///
/// Must run before any metric is recorded. Calling it again after it
/// succeeded is a no-op; a racing second caller gets an error.
pub fn init_metrics() -> Result<(), AppError> {
    if METRICS_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new().install_recorder().map_err(|e| {
        AppError::ConfigError(anyhow::anyhow!("failed to install Prometheus recorder: {}", e))
    })?;

    // install_recorder succeeds once per process, so the cell is still empty here.
    let _ = METRICS_HANDLE.set(handle);
    Ok(())
}

/// Current metrics in Prometheus text format.
pub fn get_metrics() -> String {
    METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_install_keeps_the_first_recorder() {
        init_metrics().unwrap();
        init_metrics().unwrap();

        metrics::counter!("metrics_install_test_total").increment(1);
        assert!(get_metrics().contains("metrics_install_test_total"));
    }
}
