//! Error responses for the feature endpoints.
//!
//! Every failure is answered with a `text/plain` body so the content type
//! always matches what the caller receives.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use osmfeatures_lib::QueryError;

/// Message returned when `osm_id` is missing or not numeric.
pub const MSG_INVALID_OSM_ID: &str = "Must specify an integer osm_id parameter.";

/// Message returned when `q` is missing or empty.
pub const MSG_MISSING_Q: &str = "Must specify a q parameter.";

/// Body of every 500 response; details go to the log only.
pub const MSG_QUERY_FAILED: &str = "Query execution failed.";

/// Failure of a feature request.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A caller-supplied parameter is missing or malformed. No query was issued.
    #[error("{0}")]
    BadRequest(String),

    /// The query succeeded but matched nothing.
    #[error("{0}")]
    NotFound(String),

    /// The query itself failed.
    #[error("upstream query failed: {0}")]
    UpstreamFailure(#[from] QueryError),
}

impl ServiceError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// 404 for a shape lookup, quoting the identifier as the caller sent it.
    pub fn boundary_not_found(osm_id: &str) -> Self {
        Self::NotFound(format!("No boundary with ID {osm_id} found."))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::UpstreamFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Low-cardinality label for metrics.
    pub fn outcome(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::NotFound(_) => "not_found",
            Self::UpstreamFailure(_) => "upstream_failure",
        }
    }

    fn body(&self) -> String {
        match self {
            Self::BadRequest(message) | Self::NotFound(message) => message.clone(),
            Self::UpstreamFailure(_) => MSG_QUERY_FAILED.to_string(),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        if let Self::UpstreamFailure(err) = &self {
            tracing::error!(error = %err, kind = err.kind(), "query execution failed");
        }

        let mut response = (self.status(), self.body()).into_response();
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(
            ServiceError::bad_request(MSG_MISSING_Q).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::boundary_not_found("1").status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServiceError::from(QueryError::Auth("denied".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn not_found_quotes_original_identifier() {
        let err = ServiceError::boundary_not_found("42abc");
        assert_eq!(err.to_string(), "No boundary with ID 42abc found.");
    }

    #[test]
    fn upstream_body_hides_details() {
        let err = ServiceError::from(QueryError::Service {
            status: 403,
            message: "Access Denied: secret-project".into(),
        });
        assert_eq!(err.body(), MSG_QUERY_FAILED);
        assert_eq!(err.outcome(), "upstream_failure");
    }

    #[test]
    fn responses_are_plain_text() {
        let response = ServiceError::bad_request(MSG_INVALID_OSM_ID).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/plain; charset=utf-8"
        );
    }
}
