//! Health check handlers for container probes.
//!
//! Provides `/health/live` and `/health/ready` endpoints that return JSON
//! status responses for liveness and readiness probes.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};

use crate::AppState;

/// Health status response for liveness and readiness probes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    /// Status indicator: "ok".
    pub status: String,

    /// Service name for identification.
    pub service: String,

    /// Service version from build-time.
    pub version: String,

    /// Feature table queried (for readiness check).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,

    /// Query backend description (for readiness check).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,
}

impl HealthStatus {
    /// Create a healthy liveness status.
    pub fn alive(service: &str, version: &str) -> Self {
        Self {
            status: "ok".to_string(),
            service: service.to_string(),
            version: version.to_string(),
            table: None,
            backend: None,
        }
    }

    /// Create a ready status describing where queries go.
    pub fn ready(service: &str, version: &str, table: &str, backend: &str) -> Self {
        Self {
            status: "ok".to_string(),
            service: service.to_string(),
            version: version.to_string(),
            table: Some(table.to_string()),
            backend: Some(backend.to_string()),
        }
    }
}

/// Liveness probe handler.
///
/// ```text
/// GET /health/live
/// {"status":"ok","service":"osmfeatures-service-shared","version":"0.1.0"}
/// ```
pub async fn health_live() -> impl IntoResponse {
    let status = HealthStatus::alive(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    (StatusCode::OK, Json(status))
}

/// Readiness probe handler.
///
/// The state only exists once the query client is configured, so reaching
/// this handler means the service can accept traffic. It does not issue a
/// query.
pub async fn health_ready(State(state): State<AppState>) -> impl IntoResponse {
    let status = HealthStatus::ready(
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        state.table().as_str(),
        state.backend(),
    );
    (StatusCode::OK, Json(status))
}
