//! Request parameters and validation for the feature endpoints.
//!
//! Parameters are read from the query string first; a missing or empty value
//! there falls back to the request body. Bodies may be JSON objects or
//! `application/x-www-form-urlencoded`; any other body is ignored.

use std::collections::HashMap;

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::header,
};
use serde_json::Value;

use osmfeatures_lib::parse_leading_integer;

use crate::error::{ServiceError, MSG_INVALID_OSM_ID, MSG_MISSING_Q};

/// Language assumed when the caller sends no `lang`.
pub const DEFAULT_LANG: &str = "en";

/// Validation trait for request types.
///
/// Implementations check every field and either produce the validated form
/// of the request or a [`ServiceError::BadRequest`].
pub trait Validate {
    /// The request after validation.
    type Output;

    fn validate(self) -> Result<Self::Output, ServiceError>;
}

/// Merged query-string and body parameters of one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestParams {
    query: HashMap<String, String>,
    body: HashMap<String, String>,
}

impl RequestParams {
    /// Build parameters from the raw query string and body.
    pub fn from_parts(
        query: Option<&str>,
        content_type: Option<&str>,
        body: &[u8],
    ) -> Result<Self, ServiceError> {
        let query = query.map(|q| parse_form(q.as_bytes())).unwrap_or_default();
        let body = parse_body(content_type, body)?;
        Ok(Self { query, body })
    }

    /// Look up `key`, preferring a non-empty query-string value.
    pub fn get(&self, key: &str) -> Option<&str> {
        fn non_empty<'a>(map: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
            map.get(key).map(String::as_str).filter(|v| !v.is_empty())
        }
        non_empty(&self.query, key).or_else(|| non_empty(&self.body, key))
    }
}

impl<S> FromRequest<S> for RequestParams
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let query = req.uri().query().map(str::to_owned);
        let content_type = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        let body = Bytes::from_request(req, state)
            .await
            .map_err(|e| ServiceError::bad_request(format!("Unreadable request body: {e}")))?;

        Self::from_parts(query.as_deref(), content_type.as_deref(), &body)
    }
}

/// Keep the first value of each key, as most web frameworks do.
fn parse_form(input: &[u8]) -> HashMap<String, String> {
    let mut params = HashMap::new();
    for (key, value) in url::form_urlencoded::parse(input) {
        params
            .entry(key.into_owned())
            .or_insert_with(|| value.into_owned());
    }
    params
}

fn parse_body(
    content_type: Option<&str>,
    body: &[u8],
) -> Result<HashMap<String, String>, ServiceError> {
    if body.is_empty() {
        return Ok(HashMap::new());
    }

    let mime = content_type
        .and_then(|ct| ct.split(';').next())
        .map(|ct| ct.trim().to_ascii_lowercase())
        .unwrap_or_default();

    match mime.as_str() {
        "application/json" => {
            let value: Value = serde_json::from_slice(body)
                .map_err(|_| ServiceError::bad_request("Malformed JSON request body."))?;
            let Value::Object(object) = value else {
                return Ok(HashMap::new());
            };
            Ok(object
                .into_iter()
                .filter_map(|(key, value)| match value {
                    Value::String(s) => Some((key, s)),
                    Value::Number(n) => Some((key, n.to_string())),
                    Value::Bool(b) => Some((key, b.to_string())),
                    _ => None,
                })
                .collect())
        }
        "application/x-www-form-urlencoded" => Ok(parse_form(body)),
        _ => Ok(HashMap::new()),
    }
}

/// Parameters of a shape lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeRequest {
    pub osm_id: Option<String>,
}

impl From<&RequestParams> for ShapeRequest {
    fn from(params: &RequestParams) -> Self {
        Self {
            osm_id: params.get("osm_id").map(String::from),
        }
    }
}

/// A shape lookup that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OsmId {
    /// Identifier exactly as the caller sent it.
    pub raw: String,
    /// Leading integer parsed from `raw`.
    pub value: i64,
}

impl Validate for ShapeRequest {
    type Output = OsmId;

    /// Accept any identifier containing a digit, then parse its leading
    /// integer. Identifiers whose digits do not lead (`"abc12"`) or that
    /// overflow `i64` are rejected with the same message.
    fn validate(self) -> Result<OsmId, ServiceError> {
        let raw = self
            .osm_id
            .filter(|id| id.bytes().any(|b| b.is_ascii_digit()))
            .ok_or_else(|| ServiceError::bad_request(MSG_INVALID_OSM_ID))?;

        let value = parse_leading_integer(&raw)
            .ok_or_else(|| ServiceError::bad_request(MSG_INVALID_OSM_ID))?;

        Ok(OsmId { raw, value })
    }
}

/// Parameters of a feature search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub q: Option<String>,
    /// Accepted for compatibility; not used by the query.
    pub lang: String,
}

impl From<&RequestParams> for SearchRequest {
    fn from(params: &RequestParams) -> Self {
        Self {
            q: params.get("q").map(String::from),
            lang: params.get("lang").unwrap_or(DEFAULT_LANG).to_string(),
        }
    }
}

/// A search that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub q: String,
    pub lang: String,
}

impl Validate for SearchRequest {
    type Output = SearchQuery;

    fn validate(self) -> Result<SearchQuery, ServiceError> {
        let q = self
            .q
            .filter(|q| !q.is_empty())
            .ok_or_else(|| ServiceError::bad_request(MSG_MISSING_Q))?;

        Ok(SearchQuery { q, lang: self.lang })
    }
}
