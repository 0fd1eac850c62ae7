//! Success response bodies.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};

/// Media type of a GeoJSON geometry.
pub const GEOJSON_CONTENT_TYPE: &str = "application/geo+json";

/// A GeoJSON document produced by the warehouse, passed through verbatim.
///
/// # Example
///
/// ```
/// use osmfeatures_service_shared::GeoJson;
///
/// let body = GeoJson::new(r#"{"type":"Point","coordinates":[1,2]}"#);
/// assert_eq!(body.as_str(), r#"{"type":"Point","coordinates":[1,2]}"#);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeoJson(String);

impl GeoJson {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl IntoResponse for GeoJson {
    fn into_response(self) -> Response {
        let mut response = (StatusCode::OK, self.0).into_response();
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(GEOJSON_CONTENT_TYPE),
        );
        response
    }
}
