//! OSM administrative boundary lookup HTTP service.
//!
//! # Endpoints
//!
//! - `GET|POST /getShape?osm_id=…` - GeoJSON geometry of one boundary
//! - `GET|POST /getOsmIds?q=…&lang=…` - up to ten boundaries whose name contains `q`
//! - `OPTIONS` on either path - CORS preflight (204)
//! - `GET /metrics` - Prometheus metrics endpoint
//! - `GET /health/live` - liveness probe
//! - `GET /health/ready` - readiness probe
//!
//! Parameters may come from the query string, a JSON body or a form body; the
//! query string wins.

#![deny(warnings)]

use std::time::Instant;

use axum::{extract::State, routing::get, Json, Router};
use tracing::info;

use osmfeatures_lib::{fetch_shape, search_features, FeatureSummary};
use osmfeatures_service_shared::{
    health_live, health_ready, metrics_handler, record_query_duration, record_search,
    record_search_results, record_shape_lookup, AppState, CorsLayer, GeoJson, MetricsLayer,
    RequestParams, SearchRequest, ServiceError, ShapeRequest, Validate,
};

/// Build the service router.
///
/// CORS applies to the feature endpoints only; the metrics layer wraps
/// everything.
pub fn router(state: AppState, metrics_path: &str) -> Router {
    let features = Router::new()
        .route("/getShape", get(get_shape).post(get_shape))
        .route("/getOsmIds", get(get_osm_ids).post(get_osm_ids))
        .layer(CorsLayer);

    Router::new()
        .merge(features)
        .route(metrics_path, get(metrics_handler))
        .route("/health/live", get(health_live))
        .route("/health/ready", get(health_ready))
        .layer(MetricsLayer)
        .with_state(state)
}

/// Handle `/getShape`.
async fn get_shape(
    State(state): State<AppState>,
    params: RequestParams,
) -> Result<GeoJson, ServiceError> {
    let result = shape(&state, &params).await;
    match &result {
        Ok(_) => record_shape_lookup("found"),
        Err(err) => record_shape_lookup(err.outcome()),
    }
    result
}

async fn shape(state: &AppState, params: &RequestParams) -> Result<GeoJson, ServiceError> {
    let osm_id = ShapeRequest::from(params).validate()?;
    info!(
        osm_id = %osm_id.raw,
        parsed = osm_id.value,
        "handling shape request",
    );

    let started = Instant::now();
    let geometry = fetch_shape(state.client(), state.table(), osm_id.value).await;
    record_query_duration("shape", started.elapsed());

    match geometry? {
        Some(geojson) => Ok(GeoJson::new(geojson)),
        None => Err(ServiceError::boundary_not_found(&osm_id.raw)),
    }
}

/// Handle `/getOsmIds`.
async fn get_osm_ids(
    State(state): State<AppState>,
    params: RequestParams,
) -> Result<Json<Vec<FeatureSummary>>, ServiceError> {
    let result = search(&state, &params).await;
    match &result {
        Ok(Json(features)) => {
            record_search("ok");
            record_search_results(features.len());
        }
        Err(err) => record_search(err.outcome()),
    }
    result
}

async fn search(
    state: &AppState,
    params: &RequestParams,
) -> Result<Json<Vec<FeatureSummary>>, ServiceError> {
    let query = SearchRequest::from(params).validate()?;
    info!(q = %query.q, lang = %query.lang, "handling search request");

    let started = Instant::now();
    let features = search_features(state.client(), state.table(), &query.q).await;
    record_query_duration("search", started.elapsed());

    let features = features?;
    info!(results = features.len(), "search completed");
    Ok(Json(features))
}
