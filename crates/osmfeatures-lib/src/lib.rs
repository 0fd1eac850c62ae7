//! OSM features library entry points.
//!
//! This crate knows how to talk to the warehouse holding OSM administrative
//! boundaries: it builds the parameterized statements, executes them through a
//! [`QueryClient`], and shapes the rows into domain records. The HTTP service
//! should only depend on the functions exported here instead of composing SQL
//! itself.
//!

#![deny(warnings)]

pub mod bigquery;
pub mod client;
pub mod error;
pub mod features;
pub mod statement;

pub use bigquery::{BigQueryClient, BigQueryConfig, Credentials};
pub use client::QueryClient;
pub use error::{QueryError, Result};
pub use features::{
    fetch_shape, parse_leading_integer, search_features, search_statement, shape_statement,
    FeatureSummary, FeatureTable, ShapeRow, DEFAULT_FEATURES_TABLE, SEARCH_LIMIT,
};
pub use statement::{QueryParam, ResultSet, Row, Statement};
