//! The seam between request handling and the query execution service.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::statement::{ResultSet, Statement};

/// Executes parameterized statements against a remote warehouse.
///
/// Implementations are stateless from the caller's point of view: two calls
/// with the same statement must behave identically whether they share a
/// client handle or not.
#[async_trait]
pub trait QueryClient: Send + Sync {
    /// Run `statement` and return the rows of its (single) result set.
    async fn query(&self, statement: Statement) -> Result<ResultSet>;
}

#[async_trait]
impl<T: QueryClient + ?Sized> QueryClient for Arc<T> {
    async fn query(&self, statement: Statement) -> Result<ResultSet> {
        (**self).query(statement).await
    }
}
