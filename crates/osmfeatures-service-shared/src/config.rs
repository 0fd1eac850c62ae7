//! Service configuration read from the environment at startup.

use std::env;

use osmfeatures_lib::{BigQueryConfig, FeatureTable, QueryError};

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 8080;

/// Startup configuration for the feature service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// HTTP listen port.
    pub port: u16,
    /// Warehouse table holding boundary features.
    pub table: FeatureTable,
    /// Query backend settings.
    pub bigquery: BigQueryConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            table: FeatureTable::default(),
            bigquery: BigQueryConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Create configuration from environment variables.
    ///
    /// - `SERVICE_PORT`: HTTP port (default: 8080)
    /// - `FEATURES_TABLE`: fully-qualified feature table
    ///   (default: `osm-shape-access.views.osm_administrative_features`)
    /// - plus everything read by [`BigQueryConfig::from_env`]
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidTable`] when `FEATURES_TABLE` is not a
    /// plain dotted identifier.
    pub fn from_env() -> Result<Self, QueryError> {
        let port = env::var("SERVICE_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let table = match env::var("FEATURES_TABLE") {
            Ok(name) if !name.trim().is_empty() => FeatureTable::new(name.trim())?,
            _ => FeatureTable::default(),
        };

        Ok(Self {
            port,
            table,
            bigquery: BigQueryConfig::from_env(),
        })
    }
}
