//! Errors raised while building or executing warehouse statements.

use std::time::Duration;

use thiserror::Error;

/// Convenient result alias for the query library.
pub type Result<T> = std::result::Result<T, QueryError>;

/// Failure raised while executing a statement against the warehouse.
#[derive(Debug, Error)]
pub enum QueryError {
    /// Transport-level failure talking to the query service.
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// The query service answered with a non-success status.
    #[error("query service returned {status}: {message}")]
    Service { status: u16, message: String },

    /// No access token could be obtained for the query service.
    #[error("failed to obtain credentials: {0}")]
    Auth(String),

    /// A response could not be decoded into rows or domain records.
    #[error("failed to decode query response: {0}")]
    Decode(String),

    /// The statement did not complete within the configured limit.
    #[error("query did not complete within {0:?}")]
    Timeout(Duration),

    /// The configured feature table name is not a safe identifier.
    #[error("invalid table name '{0}'; expected only letters, digits, '_', '-' and '.'")]
    InvalidTable(String),

    /// No billing project was configured or discoverable.
    #[error("no project configured; set BIGQUERY_PROJECT or GOOGLE_CLOUD_PROJECT")]
    MissingProject,
}

impl From<serde_json::Error> for QueryError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

impl QueryError {
    /// Short, low-cardinality label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Http(_) => "http",
            Self::Service { .. } => "service",
            Self::Auth(_) => "auth",
            Self::Decode(_) => "decode",
            Self::Timeout(_) => "timeout",
            Self::InvalidTable(_) => "invalid_table",
            Self::MissingProject => "missing_project",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_error_includes_status_and_message() {
        let err = QueryError::Service {
            status: 400,
            message: "Syntax error".to_string(),
        };
        assert_eq!(err.to_string(), "query service returned 400: Syntax error");
        assert_eq!(err.kind(), "service");
    }

    #[test]
    fn json_errors_become_decode_errors() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: QueryError = json_err.into();
        assert_eq!(err.kind(), "decode");
    }

    #[test]
    fn timeout_mentions_duration() {
        let err = QueryError::Timeout(Duration::from_secs(3));
        assert!(err.to_string().contains("3s"));
    }
}
