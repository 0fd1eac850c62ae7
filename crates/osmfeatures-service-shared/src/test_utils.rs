//! Test utilities for handler testing.
//!
//! [`MockQueryClient`] stands in for the warehouse: it records every
//! statement it receives and answers with canned rows or a canned failure.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use osmfeatures_lib::{FeatureTable, QueryClient, QueryError, ResultSet, Row, Statement};
use serde_json::Value;

use crate::state::AppState;

#[derive(Debug, Clone)]
enum Reply {
    Rows(Vec<Row>),
    Failure { status: u16, message: String },
}

/// In-memory [`QueryClient`] with a fixed reply.
///
/// Clones share the statement log, so a test can keep one handle and give
/// another to [`AppState`].
#[derive(Debug, Clone)]
pub struct MockQueryClient {
    reply: Reply,
    statements: Arc<Mutex<Vec<Statement>>>,
}

impl MockQueryClient {
    /// A client whose every query returns zero rows.
    pub fn empty() -> Self {
        Self::with_rows(Vec::new())
    }

    /// A client whose every query returns `rows`.
    pub fn with_rows(rows: Vec<Row>) -> Self {
        Self {
            reply: Reply::Rows(rows),
            statements: Arc::default(),
        }
    }

    /// A client answering every query with a service error.
    pub fn failing(status: u16, message: impl Into<String>) -> Self {
        Self {
            reply: Reply::Failure {
                status,
                message: message.into(),
            },
            statements: Arc::default(),
        }
    }

    /// Statements received so far, oldest first.
    pub fn statements(&self) -> Vec<Statement> {
        self.statements
            .lock()
            .map(|log| log.clone())
            .unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.statements.lock().map(|log| log.len()).unwrap_or(0)
    }

    /// Wrap a clone of this client in an [`AppState`] over the default table.
    pub fn state(&self) -> AppState {
        AppState::from_client(Arc::new(self.clone()), FeatureTable::default())
    }
}

#[async_trait]
impl QueryClient for MockQueryClient {
    async fn query(&self, statement: Statement) -> Result<ResultSet, QueryError> {
        if let Ok(mut log) = self.statements.lock() {
            log.push(statement);
        }
        match &self.reply {
            Reply::Rows(rows) => Ok(ResultSet::new(rows.clone())),
            Reply::Failure { status, message } => Err(QueryError::Service {
                status: *status,
                message: message.clone(),
            }),
        }
    }
}

/// Build a result row from a JSON object literal.
///
/// # Panics
///
/// Panics if `value` is not an object.
pub fn row(value: Value) -> Row {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object for a row, got {other}"),
    }
}
