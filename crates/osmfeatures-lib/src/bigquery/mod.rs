//! [`QueryClient`] backed by the BigQuery REST API (`jobs.query`).
//!
//! Statements run as standard SQL with positional parameters. When BigQuery
//! answers before the job finishes (`jobComplete: false`) the client long-polls
//! `jobs.getQueryResults` until it does. The whole exchange is bounded by
//! [`BigQueryConfig::query_timeout`]; nothing is retried.

mod auth;
mod wire;

use std::env;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use tracing::{debug, info};

pub use auth::{Credentials, METADATA_BASE_URL};

use crate::client::QueryClient;
use crate::error::{QueryError, Result};
use crate::statement::{ResultSet, Statement};
use wire::{ErrorResponse, QueryRequest, QueryResponse};

/// Production BigQuery API root.
pub const DEFAULT_ENDPOINT: &str = "https://bigquery.googleapis.com";

/// Default bound on one statement, including polling.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(30);

/// How long each BigQuery call may block waiting for the job.
const POLL_WAIT_MS: u64 = 10_000;

const USER_AGENT: &str = concat!("osmfeatures/", env!("CARGO_PKG_VERSION"));

/// Connection settings for [`BigQueryClient`].
#[derive(Debug, Clone)]
pub struct BigQueryConfig {
    /// API root, without a trailing slash.
    pub endpoint: String,
    /// Project billed for query jobs; discovered from the metadata server when `None`.
    pub project: Option<String>,
    /// Job location (for example `US` or `EU`).
    pub location: Option<String>,
    pub credentials: Credentials,
    pub query_timeout: Duration,
}

impl Default for BigQueryConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            project: None,
            location: None,
            credentials: Credentials::default(),
            query_timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }
}

impl BigQueryConfig {
    /// Create configuration from environment variables.
    ///
    /// - `BIGQUERY_PROJECT` or `GOOGLE_CLOUD_PROJECT`: billing project
    /// - `BIGQUERY_LOCATION`: job location
    /// - `BIGQUERY_ACCESS_TOKEN`: static bearer token
    /// - `BIGQUERY_EMULATOR_HOST`: emulator address; implies anonymous access
    ///   unless a token is also set
    /// - `QUERY_TIMEOUT_SECS`: per-statement bound (default: 30)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from any variable source; blank values count as unset.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let emulator = var("BIGQUERY_EMULATOR_HOST").map(|host| {
            if host.contains("://") {
                host
            } else {
                format!("http://{host}")
            }
        });
        let credentials = match (var("BIGQUERY_ACCESS_TOKEN"), &emulator) {
            (Some(token), _) => Credentials::AccessToken(token),
            (None, Some(_)) => Credentials::Anonymous,
            (None, None) => Credentials::default(),
        };
        let endpoint = emulator.unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());

        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            project: var("BIGQUERY_PROJECT").or_else(|| var("GOOGLE_CLOUD_PROJECT")),
            location: var("BIGQUERY_LOCATION"),
            credentials,
            query_timeout: var("QUERY_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_QUERY_TIMEOUT),
        }
    }
}

/// BigQuery REST client.
///
/// Cheap to clone; the inner `reqwest::Client` pools connections.
#[derive(Debug, Clone)]
pub struct BigQueryClient {
    http: Client,
    endpoint: String,
    project: String,
    location: Option<String>,
    credentials: Credentials,
    query_timeout: Duration,
}

impl BigQueryClient {
    /// Build a client for a known project.
    pub fn new(config: BigQueryConfig, project: impl Into<String>) -> Result<Self> {
        let http = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            http,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            project: project.into(),
            location: config.location,
            credentials: config.credentials,
            query_timeout: config.query_timeout,
        })
    }

    /// Build a client, asking the metadata server for the project if needed.
    pub async fn connect(config: BigQueryConfig) -> Result<Self> {
        let project = match config.project.clone() {
            Some(project) => project,
            None => {
                let http = Client::builder().user_agent(USER_AGENT).build()?;
                config.credentials.discover_project(&http).await?
            }
        };
        info!(
            project = %project,
            endpoint = %config.endpoint,
            "bigquery client configured",
        );
        Self::new(config, project)
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn run(&self, statement: &Statement) -> Result<ResultSet> {
        let request = QueryRequest::from_statement(statement, self.location.clone(), POLL_WAIT_MS);
        let url = format!(
            "{}/bigquery/v2/projects/{}/queries",
            self.endpoint, self.project
        );
        let mut response = self.send(self.http.post(&url).json(&request)).await?;

        while !response.job_complete {
            let job = response.job_reference.clone().ok_or_else(|| {
                QueryError::Decode("incomplete job response without jobReference".to_string())
            })?;
            debug!(job_id = %job.job_id, "query job still running");

            let mut params = vec![("timeoutMs", POLL_WAIT_MS.to_string())];
            if let Some(location) = job.location.or_else(|| self.location.clone()) {
                params.push(("location", location));
            }
            let poll_url = format!("{url}/{}", job.job_id);
            response = self.send(self.http.get(&poll_url).query(&params)).await?;
        }

        if response.page_token.is_some() {
            debug!(statement = statement.name, "ignoring further result pages");
        }
        response.into_result_set()
    }

    async fn send(&self, builder: RequestBuilder) -> Result<QueryResponse> {
        let builder = match self.credentials.bearer_token(&self.http).await? {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        };

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(QueryError::Service {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl QueryClient for BigQueryClient {
    async fn query(&self, statement: Statement) -> Result<ResultSet> {
        let started = Instant::now();
        let results = tokio::time::timeout(self.query_timeout, self.run(&statement))
            .await
            .map_err(|_| QueryError::Timeout(self.query_timeout))??;

        debug!(
            statement = statement.name,
            rows = results.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "bigquery statement completed"
        );
        Ok(results)
    }
}
