//! Access tokens for the BigQuery REST API.

use reqwest::Client;
use serde::Deserialize;

use crate::error::{QueryError, Result};

/// Metadata server available on Cloud Run, Cloud Functions and GCE.
pub const METADATA_BASE_URL: &str = "http://metadata.google.internal/computeMetadata/v1";

const METADATA_FLAVOR: (&str, &str) = ("Metadata-Flavor", "Google");

/// Where bearer tokens come from.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// A fixed token, typically from `gcloud auth print-access-token`.
    AccessToken(String),
    /// The default service account of the metadata server at `base_url`.
    MetadataServer { base_url: String },
    /// No `Authorization` header (emulators).
    Anonymous,
}

impl Default for Credentials {
    fn default() -> Self {
        Self::MetadataServer {
            base_url: METADATA_BASE_URL.to_string(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AccessToken(_) => f.write_str("AccessToken(<redacted>)"),
            Self::MetadataServer { base_url } => f
                .debug_struct("MetadataServer")
                .field("base_url", base_url)
                .finish(),
            Self::Anonymous => f.write_str("Anonymous"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

impl Credentials {
    /// Obtain a bearer token, or `None` for anonymous access.
    ///
    /// Metadata tokens are fetched per call; the metadata server caches them.
    pub async fn bearer_token(&self, http: &Client) -> Result<Option<String>> {
        match self {
            Self::AccessToken(token) => Ok(Some(token.clone())),
            Self::Anonymous => Ok(None),
            Self::MetadataServer { base_url } => {
                let url = format!("{base_url}/instance/service-accounts/default/token");
                let response = http
                    .get(&url)
                    .header(METADATA_FLAVOR.0, METADATA_FLAVOR.1)
                    .send()
                    .await
                    .map_err(|e| QueryError::Auth(format!("metadata server unreachable: {e}")))?;

                if !response.status().is_success() {
                    return Err(QueryError::Auth(format!(
                        "metadata server returned {}",
                        response.status()
                    )));
                }

                let token: TokenResponse = response
                    .json()
                    .await
                    .map_err(|e| QueryError::Auth(format!("invalid token response: {e}")))?;
                Ok(Some(token.access_token))
            }
        }
    }

    /// Ask the metadata server which project this workload runs in.
    pub async fn discover_project(&self, http: &Client) -> Result<String> {
        let Self::MetadataServer { base_url } = self else {
            return Err(QueryError::MissingProject);
        };

        let response = http
            .get(format!("{base_url}/project/project-id"))
            .header(METADATA_FLAVOR.0, METADATA_FLAVOR.1)
            .send()
            .await
            .map_err(|_| QueryError::MissingProject)?;
        if !response.status().is_success() {
            return Err(QueryError::MissingProject);
        }

        let project = response.text().await?.trim().to_string();
        if project.is_empty() {
            return Err(QueryError::MissingProject);
        }
        Ok(project)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_token_is_returned_verbatim() {
        let http = Client::new();
        let token = Credentials::AccessToken("ya29.token".into())
            .bearer_token(&http)
            .await
            .unwrap();
        assert_eq!(token.as_deref(), Some("ya29.token"));
    }

    #[tokio::test]
    async fn anonymous_has_no_token() {
        let http = Client::new();
        assert!(Credentials::Anonymous
            .bearer_token(&http)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn only_metadata_credentials_discover_projects() {
        let http = Client::new();
        let err = Credentials::Anonymous
            .discover_project(&http)
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::MissingProject));
    }

    #[test]
    fn debug_redacts_tokens() {
        let debug = format!("{:?}", Credentials::AccessToken("secret".into()));
        assert!(!debug.contains("secret"));
    }
}
