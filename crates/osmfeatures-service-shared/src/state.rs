//! Application state for the HTTP service.
//!
//! This module provides the shared state structure that axum handlers use to
//! reach the query client and the configured feature table.

use std::sync::Arc;

use osmfeatures_lib::{BigQueryClient, FeatureTable, QueryClient, QueryError};

use crate::config::ServiceConfig;

/// Error during application state initialization.
#[derive(Debug)]
pub enum AppStateError {
    /// The query client could not be constructed.
    ClientInit(QueryError),
}

impl std::fmt::Display for AppStateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ClientInit(e) => write!(f, "failed to initialize query client: {}", e),
        }
    }
}

impl std::error::Error for AppStateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ClientInit(e) => Some(e),
        }
    }
}

impl From<QueryError> for AppStateError {
    fn from(err: QueryError) -> Self {
        Self::ClientInit(err)
    }
}

/// Shared application state for all axum handlers.
///
/// This struct is cheaply cloneable (using `Arc` internally) and should be
/// shared via axum's `State` extractor. Holding the client here means every
/// request reuses one handle; nothing about the client is request-specific.
///
/// # Example
///
/// ```ignore
/// use axum::{Router, routing::get, extract::State};
/// use osmfeatures_service_shared::AppState;
///
/// async fn handler(State(state): State<AppState>) {
///     let rows = state.client().query(statement).await?;
/// }
///
/// let state = AppState::connect(ServiceConfig::from_env()?).await?;
/// let app = Router::new()
///     .route("/getShape", get(handler))
///     .with_state(state);
/// ```
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    client: Arc<dyn QueryClient>,
    table: FeatureTable,
    backend: String,
}

impl AppState {
    /// Build state backed by BigQuery.
    ///
    /// Resolves the billing project (from configuration or the metadata
    /// server) before returning.
    pub async fn connect(config: ServiceConfig) -> Result<Self, AppStateError> {
        tracing::info!(table = %config.table, "connecting to bigquery");
        let client = BigQueryClient::connect(config.bigquery).await?;
        let backend = format!("bigquery:{}", client.project());

        Ok(Self::with_backend(Arc::new(client), config.table, backend))
    }

    /// Create application state from an existing client.
    ///
    /// This is useful for testing or when embedding another backend.
    pub fn from_client(client: Arc<dyn QueryClient>, table: FeatureTable) -> Self {
        Self::with_backend(client, table, "custom".to_string())
    }

    fn with_backend(client: Arc<dyn QueryClient>, table: FeatureTable, backend: String) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                client,
                table,
                backend,
            }),
        }
    }

    /// Access the query client.
    pub fn client(&self) -> &dyn QueryClient {
        self.inner.client.as_ref()
    }

    /// Access the configured feature table.
    pub fn table(&self) -> &FeatureTable {
        &self.inner.table
    }

    /// Short description of the query backend, for health output.
    pub fn backend(&self) -> &str {
        &self.inner.backend
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("table", &self.inner.table.as_str())
            .field("backend", &self.inner.backend)
            .finish()
    }
}
