//! Exercises `BigQueryClient` against an in-process server speaking the
//! subset of the BigQuery REST API the client uses.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use osmfeatures_lib::{
    fetch_shape, search_features, BigQueryClient, BigQueryConfig, Credentials, FeatureTable,
    QueryClient, QueryError, QueryParam, Statement,
};

#[derive(Clone, Default)]
struct Recorded {
    bodies: Arc<Mutex<Vec<Value>>>,
    auth: Arc<Mutex<Vec<Option<String>>>>,
    polls: Arc<Mutex<usize>>,
}

#[derive(Clone)]
struct Fake {
    recorded: Recorded,
    mode: &'static str,
}

async fn queries(
    State(fake): State<Fake>,
    Path(project): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> axum::response::Response {
    assert_eq!(project, "test-project");
    fake.recorded.bodies.lock().unwrap().push(body.clone());
    fake.recorded.auth.lock().unwrap().push(
        headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(String::from),
    );

    match fake.mode {
        "error" => (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": {"code": 400, "message": "Unrecognized name: geometryy"}})),
        )
            .into_response(),
        "slow" => {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({"jobComplete": true})).into_response()
        }
        "pending" => Json(json!({
            "jobComplete": false,
            "jobReference": {"projectId": "test-project", "jobId": "job_123", "location": "EU"}
        }))
        .into_response(),
        "shape" => Json(json!({
            "jobComplete": true,
            "schema": {"fields": [{"name": "geometry", "type": "STRING", "mode": "NULLABLE"}]},
            "rows": [{"f": [{"v": "{\"type\":\"Point\",\"coordinates\":[1,2]}"}]}]
        }))
        .into_response(),
        "search" => Json(json!({
            "jobComplete": true,
            "schema": {"fields": [
                {"name": "osm_id", "type": "INTEGER", "mode": "NULLABLE"},
                {"name": "name", "type": "STRING", "mode": "NULLABLE"},
                {"name": "all_tags", "type": "RECORD", "mode": "REPEATED", "fields": [
                    {"name": "key", "type": "STRING"},
                    {"name": "value", "type": "STRING"}
                ]}
            ]},
            "rows": [
                {"f": [{"v": "-1"}, {"v": "Springfield"}, {"v": [
                    {"v": {"f": [{"v": "admin_level"}, {"v": "4"}]}}
                ]}]},
                {"f": [{"v": "-2"}, {"v": "West Springfield"}, {"v": []}]}
            ]
        }))
        .into_response(),
        _ => Json(json!({"jobComplete": true, "schema": {"fields": []}})).into_response(),
    }
}

async fn poll(
    State(fake): State<Fake>,
    Path((_project, job_id)): Path<(String, String)>,
) -> Json<Value> {
    assert_eq!(job_id, "job_123");
    *fake.recorded.polls.lock().unwrap() += 1;
    Json(json!({
        "jobComplete": true,
        "schema": {"fields": [{"name": "geometry", "type": "STRING"}]},
        "rows": [{"f": [{"v": "{}"}]}]
    }))
}

async fn spawn_fake(mode: &'static str) -> (String, Recorded) {
    let recorded = Recorded::default();
    let app = Router::new()
        .route("/bigquery/v2/projects/{project}/queries", post(queries))
        .route(
            "/bigquery/v2/projects/{project}/queries/{job_id}",
            get(poll),
        )
        .with_state(Fake {
            recorded: recorded.clone(),
            mode,
        });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}"), recorded)
}

fn client(endpoint: String, credentials: Credentials, timeout: Duration) -> BigQueryClient {
    let config = BigQueryConfig {
        endpoint,
        project: Some("test-project".to_string()),
        location: None,
        credentials,
        query_timeout: timeout,
    };
    BigQueryClient::new(config, "test-project").unwrap()
}

#[tokio::test]
async fn sends_positional_parameters_with_bearer_token() {
    let (endpoint, recorded) = spawn_fake("shape").await;
    let client = client(
        endpoint,
        Credentials::AccessToken("ya29.test".into()),
        Duration::from_secs(5),
    );

    let statement = Statement::new("test", "SELECT ?").bind(QueryParam::Int64(42));
    let results = client.query(statement).await.unwrap();

    assert_eq!(results.len(), 1);
    let bodies = recorded.bodies.lock().unwrap();
    assert_eq!(bodies[0]["query"], json!("SELECT ?"));
    assert_eq!(bodies[0]["parameterMode"], json!("POSITIONAL"));
    assert_eq!(
        bodies[0]["queryParameters"][0]["parameterValue"]["value"],
        json!("42")
    );
    assert_eq!(
        recorded.auth.lock().unwrap()[0].as_deref(),
        Some("Bearer ya29.test")
    );
}

#[tokio::test]
async fn anonymous_credentials_send_no_authorization() {
    let (endpoint, recorded) = spawn_fake("empty").await;
    let client = client(endpoint, Credentials::Anonymous, Duration::from_secs(5));

    let results = client
        .query(Statement::new("test", "SELECT 1"))
        .await
        .unwrap();

    assert!(results.is_empty());
    assert!(recorded.auth.lock().unwrap()[0].is_none());
}

#[tokio::test]
async fn polls_until_job_completes() {
    let (endpoint, recorded) = spawn_fake("pending").await;
    let client = client(endpoint, Credentials::Anonymous, Duration::from_secs(5));

    let results = client
        .query(Statement::new("test", "SELECT 1"))
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(*recorded.polls.lock().unwrap(), 1);
}

#[tokio::test]
async fn service_errors_carry_status_and_message() {
    let (endpoint, _recorded) = spawn_fake("error").await;
    let client = client(endpoint, Credentials::Anonymous, Duration::from_secs(5));

    let err = client
        .query(Statement::new("test", "SELECT geometryy"))
        .await
        .unwrap_err();

    match err {
        QueryError::Service { status, message } => {
            assert_eq!(status, 400);
            assert!(message.contains("Unrecognized name"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn slow_queries_time_out() {
    let (endpoint, _recorded) = spawn_fake("slow").await;
    let client = client(endpoint, Credentials::Anonymous, Duration::from_millis(100));

    let err = client
        .query(Statement::new("test", "SELECT 1"))
        .await
        .unwrap_err();

    assert!(matches!(err, QueryError::Timeout(_)));
}

#[tokio::test]
async fn fetch_shape_returns_geojson_text() {
    let (endpoint, recorded) = spawn_fake("shape").await;
    let client = client(endpoint, Credentials::Anonymous, Duration::from_secs(5));

    let shape = fetch_shape(&client, &FeatureTable::default(), 42)
        .await
        .unwrap();

    assert_eq!(
        shape.as_deref(),
        Some("{\"type\":\"Point\",\"coordinates\":[1,2]}")
    );
    let bodies = recorded.bodies.lock().unwrap();
    assert_eq!(
        bodies[0]["queryParameters"][0]["parameterType"]["type"],
        json!("INT64")
    );
}

#[tokio::test]
async fn search_features_decodes_tag_records() {
    let (endpoint, recorded) = spawn_fake("search").await;
    let client = client(endpoint, Credentials::Anonymous, Duration::from_secs(5));

    let features = search_features(&client, &FeatureTable::default(), "Spring")
        .await
        .unwrap();

    assert_eq!(features.len(), 2);
    assert_eq!(features[0].osm_id, -1);
    assert_eq!(features[0].name.as_deref(), Some("Springfield"));
    assert_eq!(features[0].all_tags.get("admin_level").unwrap(), "4");
    assert!(features[1].all_tags.is_empty());

    let bodies = recorded.bodies.lock().unwrap();
    assert_eq!(
        bodies[0]["queryParameters"][0]["parameterValue"]["value"],
        json!("%Spring%")
    );
}
