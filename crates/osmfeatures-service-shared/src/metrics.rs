//! Prometheus metrics for the feature service.
//!
//! - [`MetricsConfig`]: whether metrics are collected and where they are served
//! - [`init_metrics`]: install the Prometheus recorder
//! - [`metrics_handler`]: axum handler rendering the exposition text
//! - business helpers for shape lookups, searches and query latency
//!
//! # Example
//!
//! ```no_run
//! use osmfeatures_service_shared::metrics::{MetricsConfig, init_metrics, metrics_handler};
//! use axum::{Router, routing::get};
//!
//! let config = MetricsConfig::default();
//! init_metrics(&config).expect("failed to initialize metrics");
//!
//! let app: Router = Router::new().route(&config.path, get(metrics_handler));
//! ```

use std::time::Duration;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

/// Global Prometheus handle for rendering metrics.
static PROMETHEUS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Configuration for the metrics system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    pub enabled: bool,
    /// Path for the metrics endpoint (e.g., "/metrics").
    pub path: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "/metrics".to_string(),
        }
    }
}

impl MetricsConfig {
    /// Create configuration from environment variables.
    ///
    /// - `METRICS_ENABLED`: "true" or "false" (default: true)
    /// - `METRICS_PATH`: Path for metrics endpoint (default: "/metrics")
    pub fn from_env() -> Self {
        let enabled = std::env::var("METRICS_ENABLED")
            .map(|v| v.to_lowercase() != "false")
            .unwrap_or(true);

        let path = std::env::var("METRICS_PATH")
            .ok()
            .filter(|p| p.starts_with('/'))
            .unwrap_or_else(|| "/metrics".to_string());

        Self { enabled, path }
    }
}

/// Install the Prometheus recorder.
///
/// Must be called once at startup, before any metric is recorded.
///
/// # Errors
///
/// Returns an error when metrics are disabled, when a recorder is already
/// installed, or when the Prometheus builder fails.
pub fn init_metrics(config: &MetricsConfig) -> Result<(), MetricsError> {
    if !config.enabled {
        return Err(MetricsError::Disabled);
    }

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| MetricsError::InstallFailed(e.to_string()))?;

    PROMETHEUS_HANDLE
        .set(handle)
        .map_err(|_| MetricsError::AlreadyInitialized)?;

    Ok(())
}

/// Axum handler for the metrics endpoint.
pub async fn metrics_handler() -> String {
    PROMETHEUS_HANDLE
        .get()
        .map(|h| h.render())
        .unwrap_or_else(|| "# Metrics not initialized\n".to_string())
}

/// Errors that can occur during metrics initialization.
#[derive(Debug, Clone)]
pub enum MetricsError {
    Disabled,
    AlreadyInitialized,
    InstallFailed(String),
}

impl std::fmt::Display for MetricsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricsError::Disabled => write!(f, "metrics are disabled"),
            MetricsError::AlreadyInitialized => write!(f, "metrics recorder already initialized"),
            MetricsError::InstallFailed(e) => {
                write!(f, "failed to install metrics recorder: {}", e)
            }
        }
    }
}

impl std::error::Error for MetricsError {}

// =============================================================================
// Business Metrics Helpers
// =============================================================================

/// Count a shape lookup by outcome ("found", "not_found", "bad_request",
/// "upstream_failure").
pub fn record_shape_lookup(outcome: &'static str) {
    metrics::counter!("osmfeatures_shape_lookups_total", "outcome" => outcome).increment(1);
}

/// Count a search by outcome ("ok", "bad_request", "upstream_failure").
pub fn record_search(outcome: &'static str) {
    metrics::counter!("osmfeatures_searches_total", "outcome" => outcome).increment(1);
}

/// Record how many features a successful search returned.
pub fn record_search_results(count: usize) {
    metrics::histogram!("osmfeatures_search_results").record(count as f64);
}

/// Record the wall time of one warehouse statement.
pub fn record_query_duration(statement: &'static str, elapsed: Duration) {
    metrics::histogram!("osmfeatures_query_duration_seconds", "statement" => statement)
        .record(elapsed.as_secs_f64());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_config_default() {
        let config = MetricsConfig::default();
        assert!(config.enabled);
        assert_eq!(config.path, "/metrics");
    }

    #[tokio::test]
    async fn test_metrics_handler_without_recorder() {
        // Global recorder state is shared across tests; either output is valid.
        let output = metrics_handler().await;
        assert!(output.contains('#') || output.is_empty());
    }

    #[test]
    fn test_business_metrics_do_not_panic() {
        record_shape_lookup("found");
        record_shape_lookup("not_found");
        record_search("ok");
        record_search_results(10);
        record_query_duration("shape", Duration::from_millis(12));
    }

    #[test]
    fn test_metrics_error_display() {
        assert_eq!(MetricsError::Disabled.to_string(), "metrics are disabled");
        assert_eq!(
            MetricsError::AlreadyInitialized.to_string(),
            "metrics recorder already initialized"
        );
        assert!(MetricsError::InstallFailed("boom".to_string())
            .to_string()
            .contains("boom"));
    }
}
