//! Shared infrastructure for the OSM features HTTP service.
//!
//! This crate provides the HTTP glue around `osmfeatures-lib`:
//!
//! - [`AppState`]: query client and feature table shared by all handlers
//! - [`ServiceConfig`]: port, table and warehouse settings from the environment
//! - [`RequestParams`]: query-string and body parameters, merged
//! - [`ServiceError`]: plain-text 400/404/500 responses
//! - [`GeoJson`]: pass-through GeoJSON success body
//! - [`CorsLayer`]: fixed permissive CORS headers and preflight handling
//! - [`health`]: liveness/readiness probes
//! - [`metrics`]: Prometheus metrics infrastructure
//! - [`logging`]: structured JSON logging setup
//! - [`middleware`]: request IDs and HTTP metrics
//!
//! # Architecture
//!
//! Handlers stay thin; SQL and row decoding live in `osmfeatures-lib`:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  axum Handler                                               │
//! │  - Extract RequestParams                                    │
//! │  - Validate parameters                                      │
//! │  - Call osmfeatures-lib (fetch_shape / search_features)     │
//! │  - Format response                                          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Testing Support
//!
//! The [`test_utils`] module provides a recording mock query client. Enable
//! the `test-utils` feature to access it from dependent crates.

#![deny(warnings)]

mod config;
pub mod cors;
mod error;
mod health;
pub mod logging;
pub mod metrics;
pub mod middleware;
mod request;
mod response;
mod state;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::{ServiceConfig, DEFAULT_PORT};
pub use cors::CorsLayer;
pub use error::{ServiceError, MSG_INVALID_OSM_ID, MSG_MISSING_Q, MSG_QUERY_FAILED};
pub use health::{health_live, health_ready, HealthStatus};
pub use logging::{init_logging, LogFormat, LoggingConfig};
pub use metrics::{
    init_metrics, metrics_handler, record_query_duration, record_search, record_search_results,
    record_shape_lookup, MetricsConfig, MetricsError,
};
pub use middleware::{extract_or_generate_request_id, MetricsLayer, RequestId};
pub use request::{
    OsmId, RequestParams, SearchQuery, SearchRequest, ShapeRequest, Validate, DEFAULT_LANG,
};
pub use response::{GeoJson, GEOJSON_CONTENT_TYPE};
pub use state::{AppState, AppStateError};
