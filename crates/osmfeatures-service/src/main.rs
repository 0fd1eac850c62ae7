//! OSM features HTTP service binary.
//!
//! # Configuration
//!
//! - `SERVICE_PORT` - HTTP port (default: 8080)
//! - `FEATURES_TABLE` - feature table
//!   (default: `osm-shape-access.views.osm_administrative_features`)
//! - `BIGQUERY_PROJECT` / `GOOGLE_CLOUD_PROJECT` - billing project (default: metadata server)
//! - `BIGQUERY_ACCESS_TOKEN`, `BIGQUERY_EMULATOR_HOST`, `BIGQUERY_LOCATION`, `QUERY_TIMEOUT_SECS`
//! - `RUST_LOG` - Log level (default: info)
//! - `LOG_FORMAT` - Log format: json (default) or text
//! - `METRICS_ENABLED`, `METRICS_PATH`

use std::net::SocketAddr;

use anyhow::Context;
use tracing::{error, info};

use osmfeatures_service::router;
use osmfeatures_service_shared::{
    init_logging, init_metrics, AppState, LoggingConfig, MetricsConfig, ServiceConfig,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let logging_config = LoggingConfig::from_env().with_service("osm-features");
    init_logging(&logging_config);

    let metrics_config = MetricsConfig::from_env();
    if let Err(e) = init_metrics(&metrics_config) {
        // Metrics are optional.
        tracing::warn!(error = %e, "failed to initialize metrics, continuing without metrics");
    }

    let config = ServiceConfig::from_env().context("invalid service configuration")?;
    let port = config.port;

    info!(
        table = %config.table,
        port = port,
        timeout_secs = config.bigquery.query_timeout.as_secs(),
        "starting osm features service"
    );

    let state = AppState::connect(config).await.map_err(|e| {
        error!(error = %e, "failed to initialize application state");
        e
    })?;

    info!(backend = state.backend(), "application state ready");

    let app = router(state, &metrics_config.path);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(addr = %addr, "listening on");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app).await?;

    Ok(())
}
