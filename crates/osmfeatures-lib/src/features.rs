//! Administrative boundary features: statements, row shapes, and lookups.
//!
//! Both lookups issue exactly one statement through a [`QueryClient`] and
//! never retry. Features are read-only here; they are owned by the warehouse.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::client::QueryClient;
use crate::error::{QueryError, Result};
use crate::statement::{QueryParam, Statement};

/// Table queried when no override is configured.
pub const DEFAULT_FEATURES_TABLE: &str = "osm-shape-access.views.osm_administrative_features";

/// Maximum number of rows returned by a search.
pub const SEARCH_LIMIT: usize = 10;

/// Fully-qualified warehouse table holding boundary features.
///
/// The name is interpolated into SQL text, so construction rejects anything
/// beyond letters, digits, `_`, `-` and `.`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureTable(String);

impl FeatureTable {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
        if valid {
            Ok(Self(name))
        } else {
            Err(QueryError::InvalidTable(name))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for FeatureTable {
    fn default() -> Self {
        Self(DEFAULT_FEATURES_TABLE.to_string())
    }
}

impl fmt::Display for FeatureTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Statement fetching one feature's geometry as GeoJSON text.
pub fn shape_statement(table: &FeatureTable, osm_id: i64) -> Statement {
    Statement::new(
        "shape",
        format!(
            "SELECT ST_ASGEOJSON(geometry) AS geometry\n\
             FROM `{table}`\n\
             WHERE osm_id = ?"
        ),
    )
    .bind(QueryParam::Int64(osm_id))
}

/// Statement finding features whose name contains `q`, lowest admin level first.
///
/// `%` and `_` inside `q` are passed through as LIKE wildcards.
pub fn search_statement(table: &FeatureTable, q: &str) -> Statement {
    Statement::new(
        "search",
        format!(
            "SELECT osm_id, name, all_tags\n\
             FROM `{table}`\n\
             WHERE name LIKE ?\n\
             AND osm_id IS NOT NULL\n\
             ORDER BY admin_level\n\
             LIMIT {SEARCH_LIMIT}"
        ),
    )
    .bind(QueryParam::String(format!("%{q}%")))
}

/// Row returned by [`shape_statement`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ShapeRow {
    pub geometry: Option<String>,
}

/// Summary of a feature returned by a search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSummary {
    pub osm_id: i64,
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_tags")]
    pub all_tags: BTreeMap<String, String>,
}

/// Accept tags either as an object or as the warehouse's repeated
/// `STRUCT<key, value>` column.
fn deserialize_tags<'de, D>(
    deserializer: D,
) -> std::result::Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Tag {
        key: String,
        value: Option<String>,
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Tags {
        Map(BTreeMap<String, Option<String>>),
        List(Vec<Tag>),
    }

    let tags = match Option::<Tags>::deserialize(deserializer)? {
        None => BTreeMap::new(),
        Some(Tags::Map(map)) => map
            .into_iter()
            .map(|(key, value)| (key, value.unwrap_or_default()))
            .collect(),
        Some(Tags::List(list)) => list
            .into_iter()
            .map(|tag| (tag.key, tag.value.unwrap_or_default()))
            .collect(),
    };
    Ok(tags)
}

/// Parse an identifier with leading-integer semantics.
///
/// Leading whitespace and one optional sign are accepted, then the longest run
/// of ASCII digits; anything after it is ignored (`"12abc"` is 12). Returns
/// `None` when no digits follow the sign (`"abc12"`) or the value does not fit
/// in an `i64`.
pub fn parse_leading_integer(input: &str) -> Option<i64> {
    let trimmed = input.trim_start();
    let unsigned = trimmed
        .strip_prefix('-')
        .or_else(|| trimmed.strip_prefix('+'))
        .unwrap_or(trimmed);
    let sign_len = trimmed.len() - unsigned.len();
    let digits = unsigned.bytes().take_while(|b| b.is_ascii_digit()).count();
    if digits == 0 {
        return None;
    }
    trimmed[..sign_len + digits].parse().ok()
}

/// Fetch the GeoJSON geometry of the feature with `osm_id`.
///
/// Returns `Ok(None)` when no row matches or the matching row has no geometry.
pub async fn fetch_shape<C>(
    client: &C,
    table: &FeatureTable,
    osm_id: i64,
) -> Result<Option<String>>
where
    C: QueryClient + ?Sized,
{
    let results = client.query(shape_statement(table, osm_id)).await?;
    debug!(osm_id, rows = results.len(), "shape query returned");

    let first = results.deserialize_rows::<ShapeRow>()?.into_iter().next();
    Ok(first.and_then(|row| row.geometry))
}

/// Find up to [`SEARCH_LIMIT`] features whose name contains `q`.
pub async fn search_features<C>(
    client: &C,
    table: &FeatureTable,
    q: &str,
) -> Result<Vec<FeatureSummary>>
where
    C: QueryClient + ?Sized,
{
    let results = client.query(search_statement(table, q)).await?;
    debug!(rows = results.len(), "search query returned");

    results.deserialize_rows()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn table_accepts_dotted_project_names() {
        let table = FeatureTable::new("my-project.dataset_1.view").unwrap();
        assert_eq!(table.as_str(), "my-project.dataset_1.view");
    }

    #[test]
    fn table_rejects_injection() {
        let err = FeatureTable::new("t` WHERE 1=1 --").unwrap_err();
        assert!(matches!(err, QueryError::InvalidTable(_)));
        assert!(FeatureTable::new("").is_err());
    }

    #[test]
    fn default_table_is_osm_view() {
        assert_eq!(FeatureTable::default().as_str(), DEFAULT_FEATURES_TABLE);
    }

    #[test]
    fn shape_statement_binds_integer() {
        let statement = shape_statement(&FeatureTable::default(), 42);
        assert!(statement.sql.contains("ST_ASGEOJSON(geometry) AS geometry"));
        assert!(statement
            .sql
            .contains("FROM `osm-shape-access.views.osm_administrative_features`"));
        assert!(statement.sql.contains("WHERE osm_id = ?"));
        assert_eq!(statement.params, vec![QueryParam::Int64(42)]);
    }

    #[test]
    fn search_statement_wraps_query_in_wildcards() {
        let statement = search_statement(&FeatureTable::default(), "Spring");
        assert!(statement.sql.contains("WHERE name LIKE ?"));
        assert!(statement.sql.contains("AND osm_id IS NOT NULL"));
        assert!(statement.sql.contains("ORDER BY admin_level"));
        assert!(statement.sql.contains("LIMIT 10"));
        assert_eq!(
            statement.params,
            vec![QueryParam::String("%Spring%".to_string())]
        );
    }

    #[test]
    fn leading_integer_parsing() {
        assert_eq!(parse_leading_integer("42"), Some(42));
        assert_eq!(parse_leading_integer("12abc"), Some(12));
        assert_eq!(parse_leading_integer("  7"), Some(7));
        assert_eq!(parse_leading_integer("-15x"), Some(-15));
        assert_eq!(parse_leading_integer("+3"), Some(3));
        assert_eq!(parse_leading_integer("1.5"), Some(1));
        assert_eq!(parse_leading_integer("abc12"), None);
        assert_eq!(parse_leading_integer("-"), None);
        assert_eq!(parse_leading_integer(""), None);
        assert_eq!(parse_leading_integer("99999999999999999999"), None);
    }

    #[test]
    fn summary_accepts_tag_list() {
        let summary: FeatureSummary = serde_json::from_value(json!({
            "osm_id": 123,
            "name": "Springfield",
            "all_tags": [
                {"key": "boundary", "value": "administrative"},
                {"key": "admin_level", "value": "8"}
            ]
        }))
        .unwrap();

        assert_eq!(summary.all_tags.get("boundary").unwrap(), "administrative");
        assert_eq!(summary.all_tags.get("admin_level").unwrap(), "8");
    }

    #[test]
    fn summary_accepts_tag_object_and_null() {
        let with_map: FeatureSummary = serde_json::from_value(json!({
            "osm_id": 1,
            "name": "A",
            "all_tags": {"name:en": "A"}
        }))
        .unwrap();
        assert_eq!(with_map.all_tags.get("name:en").unwrap(), "A");

        let with_null: FeatureSummary = serde_json::from_value(json!({
            "osm_id": 2,
            "name": null,
            "all_tags": null
        }))
        .unwrap();
        assert!(with_null.all_tags.is_empty());
        assert!(with_null.name.is_none());
    }

    #[test]
    fn summary_serializes_tags_as_object() {
        let mut all_tags = BTreeMap::new();
        all_tags.insert("type".to_string(), "boundary".to_string());
        let summary = FeatureSummary {
            osm_id: 5,
            name: Some("Five".to_string()),
            all_tags,
        };

        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(
            value,
            json!({"osm_id": 5, "name": "Five", "all_tags": {"type": "boundary"}})
        );
    }
}
