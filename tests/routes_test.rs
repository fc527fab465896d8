//! Route handler integration tests
//!
//! Handlers are called directly with body bytes; responses are decoded back
//! into JSON.

use bytes::Bytes;
use clap::Parser;
use http_body_util::{BodyExt, Full};
use hyper::{Response, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use mongo_viewer::db::{Document, MockConnector};
use mongo_viewer::{routes, AppState, Args};

const BROWSE: &str = "mongodb://browse";
const PERSONAL: &str = "mongodb://personal";

fn doc(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {}", other),
    }
}

fn state(browse: &MockConnector, insert: &MockConnector, personal: Option<&str>) -> AppState {
    let mut argv = vec!["mongo-viewer", "--mongodb-uri", BROWSE];
    if let Some(uri) = personal {
        argv.extend_from_slice(&["--personal-db-uri", uri]);
    }
    let mut args = Args::parse_from(argv);
    // Keep the environment from leaking a personal db into the tests
    if personal.is_none() {
        args.personal_db_uri = None;
    }
    AppState::new(args, Arc::new(browse.clone()), Arc::new(insert.clone()))
}

async fn body_json(response: Response<Full<Bytes>>) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn seeded() -> MockConnector {
    MockConnector::new()
        .with_collection(
            BROWSE,
            "people",
            vec![
                doc(json!({"name": "Ada", "age": 36, "tags": ["math"]})),
                doc(json!({"name": "Alan", "address": {"city": "London"}})),
            ],
        )
        .with_collection(BROWSE, "empty", vec![])
        .with_collection("mongodb://other", "logs", vec![])
}

#[tokio::test]
async fn test_server_up() {
    let (status, body) = body_json(routes::server_up()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "server up"}));
}

#[tokio::test]
async fn test_connect_without_url_uses_default() {
    let state = state(&seeded(), &MockConnector::new(), None);

    let (status, body) = body_json(routes::handle_connect(&state, Bytes::from("{}")).await).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"collections": ["people", "empty"]}));
}

#[tokio::test]
async fn test_connect_with_url() {
    let state = state(&seeded(), &MockConnector::new(), None);

    let request = Bytes::from(r#"{"mongoUrl":"mongodb://other"}"#);
    let (status, body) = body_json(routes::handle_connect(&state, request).await).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"collections": ["logs"]}));
}

#[tokio::test]
async fn test_connect_failure_is_500() {
    let browse = seeded().fail_connect("mongodb://down");
    let state = state(&browse, &MockConnector::new(), None);

    let request = Bytes::from(r#"{"mongoUrl":"mongodb://down"}"#);
    let (status, body) = body_json(routes::handle_connect(&state, request).await).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    // Driver text (which names the host) stays in the logs
    assert_eq!(body, json!({"error": "Failed to connect to MongoDB"}));
}

#[tokio::test]
async fn test_connect_malformed_body_is_400() {
    let state = state(&seeded(), &MockConnector::new(), None);

    let (status, body) = body_json(routes::handle_connect(&state, Bytes::from("{oops")).await).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_fetch_before_connect_is_400() {
    let state = state(&seeded(), &MockConnector::new(), None);

    let (status, body) = body_json(routes::handle_fetch(&state, "people").await).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Not connected to MongoDB"}));
}

#[tokio::test]
async fn test_fetch_returns_raw_documents() {
    let state = state(&seeded(), &MockConnector::new(), None);
    routes::handle_connect(&state, Bytes::new()).await;

    let (status, body) = body_json(routes::handle_fetch(&state, "people").await).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["tags"], json!(["math"]));
    assert_eq!(body["data"][1]["address"]["city"], json!("London"));
}

#[tokio::test]
async fn test_fetch_unknown_collection_is_500() {
    let state = state(&seeded(), &MockConnector::new(), None);
    routes::handle_connect(&state, Bytes::new()).await;

    let (status, body) = body_json(routes::handle_fetch(&state, "missing").await).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Failed to fetch collection data"}));
}

#[tokio::test]
async fn test_table_uses_first_document_columns() {
    let state = state(&seeded(), &MockConnector::new(), None);
    routes::handle_connect(&state, Bytes::new()).await;

    let (status, body) = body_json(routes::handle_table(&state, "people", None).await).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["columns"], json!(["name", "age", "tags"]));
    assert_eq!(
        body["rows"],
        json!([["Ada", "36", "[\"math\"]"], ["Alan", "", ""]])
    );
}

#[tokio::test]
async fn test_table_union_columns() {
    let state = state(&seeded(), &MockConnector::new(), None);
    routes::handle_connect(&state, Bytes::new()).await;

    let response = routes::handle_table(&state, "people", Some("columns=union")).await;
    let (status, body) = body_json(response).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["columns"], json!(["name", "age", "tags", "address"]));
    assert_eq!(body["rows"][1][3], json!("{\"city\":\"London\"}"));
}

#[tokio::test]
async fn test_table_empty_collection() {
    let state = state(&seeded(), &MockConnector::new(), None);
    routes::handle_connect(&state, Bytes::new()).await;

    let (status, body) = body_json(routes::handle_table(&state, "empty", None).await).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"columns": [], "rows": []}));
}

#[tokio::test]
async fn test_insert_without_personal_db_is_500() {
    let state = state(&seeded(), &MockConnector::new(), None);

    let response = routes::handle_insert(&state, "notes", Bytes::from(r#"{"a":1}"#)).await;
    let (status, body) = body_json(response).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("PERSONAL_DB_URI"));
}

#[tokio::test]
async fn test_insert_returns_inserted_id() {
    let insert = MockConnector::new();
    let state = state(&seeded(), &insert, Some(PERSONAL));

    let response = routes::handle_insert(&state, "notes", Bytes::from(r#"{"text":"hi"}"#)).await;
    let (status, body) = body_json(response).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].is_string());
    assert!(body["insertedId"].is_string());
    assert_eq!(insert.documents(PERSONAL, "notes").len(), 1);
    assert!(insert.open_handles().is_empty());
}

#[tokio::test]
async fn test_insert_non_object_is_400() {
    let state = state(&seeded(), &MockConnector::new(), Some(PERSONAL));

    let response = routes::handle_insert(&state, "notes", Bytes::from("[1,2]")).await;
    let (status, _) = body_json(response).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_insert_store_failure_is_500() {
    let insert = MockConnector::new().fail_insert(PERSONAL);
    let state = state(&seeded(), &insert, Some(PERSONAL));

    let response = routes::handle_insert(&state, "notes", Bytes::from("{}")).await;
    let (status, body) = body_json(response).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Failed to insert document"}));
    assert!(insert.open_handles().is_empty());
}

#[tokio::test]
async fn test_health_reports_connection() {
    let state = state(&seeded(), &MockConnector::new(), None);

    let (_, body) = body_json(routes::health_check(&state)).await;
    assert_eq!(body["healthy"], json!(true));
    assert_eq!(body["connection"], json!({"status": "disconnected"}));

    routes::handle_connect(&state, Bytes::new()).await;
    let (_, body) = body_json(routes::health_check(&state)).await;
    assert_eq!(
        body["connection"],
        json!({"status": "connected", "uri": BROWSE})
    );
}

#[tokio::test]
async fn test_health_answers_while_connect_is_pending() {
    let browse = seeded().with_connect_delay(Duration::from_millis(200));
    let state = Arc::new(state(&browse, &MockConnector::new(), Some(PERSONAL)));

    let pending = {
        let state = Arc::clone(&state);
        tokio::spawn(async move { routes::handle_connect(&state, Bytes::new()).await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;

    let (status, body) = body_json(routes::health_check(&state)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["connection"], json!({"status": "connecting"}));
    assert_eq!(body["personalDbConfigured"], json!(true));

    let (status, _) = body_json(pending.await.unwrap()).await;
    assert_eq!(status, StatusCode::OK);
}
