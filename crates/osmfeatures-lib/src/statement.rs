//! Parameterized statements and the row sets they produce.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{QueryError, Result};

/// A positional query parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum QueryParam {
    Int64(i64),
    String(String),
}

impl QueryParam {
    /// Standard SQL type name of this parameter.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Int64(_) => "INT64",
            Self::String(_) => "STRING",
        }
    }

    /// Parameter value in the string form used on the wire.
    pub fn wire_value(&self) -> String {
        match self {
            Self::Int64(value) => value.to_string(),
            Self::String(value) => value.clone(),
        }
    }
}

/// SQL text with `?` placeholders and the values bound to them, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    /// Low-cardinality name used in logs and metrics.
    pub name: &'static str,
    pub sql: String,
    pub params: Vec<QueryParam>,
}

impl Statement {
    pub fn new(name: &'static str, sql: impl Into<String>) -> Self {
        Self {
            name,
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Append a positional parameter.
    pub fn bind(mut self, param: QueryParam) -> Self {
        self.params.push(param);
        self
    }
}

/// A single record keyed by column name.
pub type Row = Map<String, Value>;

/// Ordered rows returned by one statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    pub rows: Vec<Row>,
}

impl ResultSet {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn first(&self) -> Option<&Row> {
        self.rows.first()
    }

    /// Deserialize every row into `T`.
    pub fn deserialize_rows<T: DeserializeOwned>(self) -> Result<Vec<T>> {
        self.rows
            .into_iter()
            .map(|row| serde_json::from_value(Value::Object(row)).map_err(QueryError::from))
            .collect()
    }
}

impl FromIterator<Row> for ResultSet {
    fn from_iter<I: IntoIterator<Item = Row>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
