//! Prometheus metrics.
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `storefront_requests_total` | Counter | `operation`, `status`, `kind` | Dispatched requests |
//! | `storefront_request_duration_seconds` | Histogram | `operation` | Request latency |
//!
//! `kind` is the error kind for failed requests and `ok` otherwise.

use std::time::Duration;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};

use crate::error::TelemetryError;
use crate::TelemetryResult;

/// Request counter name.
pub const REQUESTS_TOTAL: &str = "storefront_requests_total";

/// Request latency histogram name.
pub const REQUEST_DURATION_SECONDS: &str = "storefront_request_duration_seconds";

/// Buckets for the latency histogram, in seconds.
const DURATION_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Handle to the installed Prometheus recorder.
///
/// Cloning is cheap; every clone renders the same registry.
#[derive(Debug, Clone)]
pub struct MetricsRegistry {
    handle: PrometheusHandle,
}

impl MetricsRegistry {
    /// Installs the global Prometheus recorder and describes the standard
    /// metrics.
    ///
    /// # Errors
    ///
    /// Returns `TelemetryError::MetricsInit` if a recorder is already
    /// installed.
    pub fn install() -> TelemetryResult<Self> {
        let handle = builder()?
            .install_recorder()
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
        describe_metrics();
        Ok(Self { handle })
    }

    /// Wraps an existing handle.
    #[must_use]
    pub fn from_handle(handle: PrometheusHandle) -> Self {
        Self { handle }
    }

    /// Renders all metrics in Prometheus text format.
    #[must_use]
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

/// Returns a builder with the standard histogram buckets.
///
/// # Errors
///
/// Returns `TelemetryError::MetricsInit` if the buckets are rejected.
pub fn builder() -> TelemetryResult<PrometheusBuilder> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full(REQUEST_DURATION_SECONDS.to_string()),
            DURATION_BUCKETS,
        )
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Registers descriptions for the standard metrics.
pub fn describe_metrics() {
    describe_counter!(REQUESTS_TOTAL, "Total number of dispatched requests");
    describe_histogram!(
        REQUEST_DURATION_SECONDS,
        metrics::Unit::Seconds,
        "Request duration in seconds"
    );
}

/// Records one dispatched request.
pub fn record_request(operation: &str, status: u16, kind: &'static str, duration: Duration) {
    counter!(
        REQUESTS_TOTAL,
        "operation" => operation.to_string(),
        "status" => status.to_string(),
        "kind" => kind
    )
    .increment(1);

    histogram!(
        REQUEST_DURATION_SECONDS,
        "operation" => operation.to_string()
    )
    .record(duration.as_secs_f64());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_without_recorder_does_not_panic() {
        record_request("getProduct", 200, "ok", Duration::from_millis(10));
    }

    #[test]
    fn test_render_recorded_request() {
        let recorder = builder().unwrap().build_recorder();
        let registry = MetricsRegistry::from_handle(recorder.handle());

        metrics::with_local_recorder(&recorder, || {
            record_request("getProduct", 404, "not_found", Duration::from_millis(3));
            record_request("getProduct", 404, "not_found", Duration::from_millis(4));
        });

        let rendered = registry.render();
        let line = rendered
            .lines()
            .find(|l| l.starts_with("storefront_requests_total{"))
            .expect("counter should be rendered");
        assert!(line.contains(r#"operation="getProduct""#));
        assert!(line.contains(r#"status="404""#));
        assert!(line.contains(r#"kind="not_found""#));
        assert!(line.ends_with(" 2"));
        assert!(rendered.contains("storefront_request_duration_seconds_bucket"));
    }
}
