//! BigQuery REST payloads and schema-aware row decoding.
//!
//! Cells arrive as `{"f":[{"v": ...}]}` with every scalar encoded as a
//! string; the schema returned alongside the rows says how to read them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::error::{QueryError, Result};
use crate::statement::{QueryParam, ResultSet, Row, Statement};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QueryRequest {
    pub query: String,
    pub use_legacy_sql: bool,
    pub parameter_mode: &'static str,
    pub query_parameters: Vec<QueryParameter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub timeout_ms: u64,
}

impl QueryRequest {
    pub fn from_statement(
        statement: &Statement,
        location: Option<String>,
        timeout_ms: u64,
    ) -> Self {
        Self {
            query: statement.sql.clone(),
            use_legacy_sql: false,
            parameter_mode: "POSITIONAL",
            query_parameters: statement.params.iter().map(QueryParameter::from).collect(),
            location,
            timeout_ms,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QueryParameter {
    pub parameter_type: ParameterType,
    pub parameter_value: ParameterValue,
}

#[derive(Debug, Serialize)]
pub(crate) struct ParameterType {
    #[serde(rename = "type")]
    pub type_name: &'static str,
}

#[derive(Debug, Serialize)]
pub(crate) struct ParameterValue {
    pub value: String,
}

impl From<&QueryParam> for QueryParameter {
    fn from(param: &QueryParam) -> Self {
        Self {
            parameter_type: ParameterType {
                type_name: param.type_name(),
            },
            parameter_value: ParameterValue {
                value: param.wire_value(),
            },
        }
    }
}

/// Body of both `jobs.query` and `jobs.getQueryResults` responses.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QueryResponse {
    #[serde(default)]
    pub job_complete: bool,
    pub job_reference: Option<JobReference>,
    pub schema: Option<TableSchema>,
    #[serde(default)]
    pub rows: Vec<TableRow>,
    pub page_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct JobReference {
    pub job_id: String,
    pub location: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct TableSchema {
    #[serde(default)]
    pub fields: Vec<TableFieldSchema>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TableFieldSchema {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    pub mode: Option<String>,
    #[serde(default)]
    pub fields: Vec<TableFieldSchema>,
}

impl TableFieldSchema {
    fn is_repeated(&self) -> bool {
        self.mode.as_deref() == Some("REPEATED")
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct TableRow {
    #[serde(default)]
    pub f: Vec<TableCell>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TableCell {
    #[serde(default)]
    pub v: Value,
}

/// Error envelope returned by Google APIs.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: String,
}

impl QueryResponse {
    /// Decode the response rows against its schema.
    pub fn into_result_set(self) -> Result<ResultSet> {
        let schema = self.schema.unwrap_or_default();
        self.rows
            .into_iter()
            .map(|row| decode_row(&schema.fields, row))
            .collect::<Result<Vec<_>>>()
            .map(ResultSet::new)
    }
}

fn decode_row(fields: &[TableFieldSchema], row: TableRow) -> Result<Row> {
    if row.f.len() != fields.len() {
        return Err(QueryError::Decode(format!(
            "row has {} cells but schema has {} fields",
            row.f.len(),
            fields.len()
        )));
    }

    let mut decoded = Map::with_capacity(fields.len());
    for (field, cell) in fields.iter().zip(row.f) {
        decoded.insert(field.name.clone(), decode_cell(field, cell.v)?);
    }
    Ok(decoded)
}

fn decode_cell(field: &TableFieldSchema, value: Value) -> Result<Value> {
    if value.is_null() {
        return Ok(Value::Null);
    }
    if !field.is_repeated() {
        return decode_value(field, value);
    }

    let Value::Array(items) = value else {
        return Err(QueryError::Decode(format!(
            "repeated field '{}' is not an array",
            field.name
        )));
    };
    items
        .into_iter()
        .map(|item| {
            let cell: TableCell = serde_json::from_value(item)?;
            decode_value(field, cell.v)
        })
        .collect::<Result<Vec<_>>>()
        .map(Value::Array)
}

fn decode_value(field: &TableFieldSchema, value: Value) -> Result<Value> {
    if value.is_null() {
        return Ok(Value::Null);
    }

    match field.field_type.as_str() {
        "RECORD" | "STRUCT" => {
            let row: TableRow = serde_json::from_value(value)?;
            decode_row(&field.fields, row).map(Value::Object)
        }
        "INTEGER" | "INT64" => {
            let text = scalar_text(field, &value)?;
            text.parse::<i64>()
                .map(Value::from)
                .map_err(|e| decode_error(field, e))
        }
        "FLOAT" | "FLOAT64" => {
            let text = scalar_text(field, &value)?;
            let number = text.parse::<f64>().map_err(|e| decode_error(field, e))?;
            Ok(Number::from_f64(number).map_or(Value::Null, Value::Number))
        }
        "BOOLEAN" | "BOOL" => match scalar_text(field, &value)? {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            other => Err(decode_error(field, format!("'{other}' is not a boolean"))),
        },
        _ => Ok(value),
    }
}

fn scalar_text<'a>(field: &TableFieldSchema, value: &'a Value) -> Result<&'a str> {
    value
        .as_str()
        .ok_or_else(|| decode_error(field, "expected a string-encoded scalar"))
}

fn decode_error(field: &TableFieldSchema, err: impl std::fmt::Display) -> QueryError {
    QueryError::Decode(format!("field '{}' ({}): {}", field.name, field.field_type, err))
}
