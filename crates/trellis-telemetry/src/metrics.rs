//! Request metrics for Trellis.
//!
//! Metrics are recorded through the `metrics` facade. [`init_metrics`]
//! installs a Prometheus recorder whose output [`render_metrics`] returns,
//! typically from a `GET /metrics` route. Without an installed recorder the
//! record functions are no-ops.
//!
//! | Metric | Type | Labels |
//! |--------|------|--------|
//! | `trellis_requests_total` | Counter | `method`, `status`, `route` |
//! | `trellis_request_duration_seconds` | Histogram | `method`, `route` |
//! | `trellis_route_misses_total` | Counter | `method` |
//! | `trellis_in_flight_requests` | Gauge | - |

use std::sync::OnceLock;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::error::TelemetryError;
use crate::TelemetryResult;

/// Route label used for requests that matched no route.
pub const UNMATCHED_ROUTE: &str = "<unmatched>";

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metrics configuration.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Whether to install the Prometheus recorder.
    pub enabled: bool,

    /// Path of the scrape route.
    pub path: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: "/metrics".to_string(),
        }
    }
}

/// Installs the Prometheus recorder and describes the Trellis metrics.
///
/// # Errors
///
/// Returns [`TelemetryError::MetricsInit`] if a recorder is already
/// installed or the scrape path is not absolute.
pub fn init_metrics(config: &MetricsConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }
    if !config.path.starts_with('/') {
        return Err(TelemetryError::MetricsInit(format!(
            "scrape path must start with '/': {}",
            config.path
        )));
    }

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;

    let _ = METRICS_HANDLE.set(handle);
    describe_metrics();
    Ok(())
}

/// Renders the current metrics in Prometheus text format, if the exporter
/// is installed.
#[must_use]
pub fn render_metrics() -> Option<String> {
    METRICS_HANDLE.get().map(PrometheusHandle::render)
}

fn describe_metrics() {
    describe_counter!(
        "trellis_requests_total",
        "Total number of requests dispatched"
    );
    describe_histogram!(
        "trellis_request_duration_seconds",
        "Dispatch duration in seconds"
    );
    describe_counter!(
        "trellis_route_misses_total",
        "Requests that matched no route"
    );
    describe_gauge!(
        "trellis_in_flight_requests",
        "Requests currently being served"
    );
}

/// Records a dispatched request.
pub fn record_request(method: &str, route: &str, status_code: u16, duration: Duration) {
    counter!(
        "trellis_requests_total",
        "method" => method.to_string(),
        "status" => status_code.to_string(),
        "route" => route.to_string()
    )
    .increment(1);

    histogram!(
        "trellis_request_duration_seconds",
        "method" => method.to_string(),
        "route" => route.to_string()
    )
    .record(duration.as_secs_f64());
}

/// Records a request that matched no route.
pub fn record_route_miss(method: &str) {
    counter!("trellis_route_misses_total", "method" => method.to_string()).increment(1);
}

/// Tracks one in-flight request for as long as it lives.
#[derive(Debug)]
pub struct InFlightGuard {
    _private: (),
}

impl InFlightGuard {
    /// Increments the in-flight gauge.
    #[must_use]
    pub fn new() -> Self {
        gauge!("trellis_in_flight_requests").increment(1.0);
        Self { _private: () }
    }
}

impl Default for InFlightGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        gauge!("trellis_in_flight_requests").decrement(1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_disabled() {
        let config = MetricsConfig::default();
        assert!(!config.enabled);
        assert!(init_metrics(&config).is_ok());
    }

    #[test]
    fn test_relative_path_rejected() {
        let config = MetricsConfig {
            enabled: true,
            path: "metrics".to_string(),
        };
        assert!(matches!(
            init_metrics(&config),
            Err(TelemetryError::MetricsInit(_))
        ));
    }

    #[test]
    fn test_record_without_recorder() {
        record_request("GET", "/users/{id}", 200, Duration::from_millis(3));
        record_route_miss("POST");
        let guard = InFlightGuard::new();
        drop(guard);
        assert!(render_metrics().is_none());
    }
}
