//! API Integration Tests
//!
//! Every test runs the router against an in-process mock of the vector
//! store and the embedding service.
//!
//! Author: hephaex@gmail.com

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use vecadmin_api::{create_router, middleware::SESSION_HEADER, state::AppState};
use vecadmin_core::config::AppConfig;
use vecadmin_vector::testing::{MockServer, MOCK_EMBEDDING_KEY};
use vecadmin_vector::OpenAiEmbedding;

fn config_for(server: &MockServer) -> AppConfig {
    let mut config = AppConfig::default();
    config.vector_db.url = server.url();
    config
}

async fn setup() -> (MockServer, Router) {
    let server = MockServer::start().await;
    let embedder = OpenAiEmbedding::new(MOCK_EMBEDDING_KEY, "text-embedding-3-small")
        .with_base_url(server.embedding_url());
    let state = AppState::new(config_for(&server)).with_embedder(Arc::new(embedder));
    let app = create_router(Arc::new(state));
    (server, app)
}

/// Send a request and decode the JSON answer (`Null` for empty bodies)
async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    session: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json");
    if let Some(session) = session {
        builder = builder.header(SESSION_HEADER, session);
    }
    let request = match body {
        Some(json_body) => builder
            .body(Body::from(serde_json::to_string(&json_body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn connect(app: &Router) -> String {
    let (status, json) = send(app, "POST", "/api/v1/connect", None, Some(json!({}))).await;
    assert_eq!(status, StatusCode::CREATED, "connect failed: {json}");
    json["session_id"].as_str().unwrap().to_string()
}

async fn create_collection(app: &Router, session: &str, name: &str) {
    let (status, json) = send(
        app,
        "POST",
        "/api/v1/collections",
        Some(session),
        Some(json!({ "name": name })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {json}");
}

// =============================================================================
// Health Check Tests
// =============================================================================

#[tokio::test]
async fn test_health_check() {
    let (_server, app) = setup().await;

    let (status, json) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_readiness_counts_sessions() {
    let (_server, app) = setup().await;
    connect(&app).await;

    let (status, json) = send(&app, "GET", "/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ready"], true);
    assert_eq!(json["active_sessions"], 1);
    assert_eq!(json["embedding_configured"], true);
}

#[tokio::test]
async fn test_openapi_document_served() {
    let (_server, app) = setup().await;

    let (status, json) = send(&app, "GET", "/api-docs/openapi.json", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["paths"]["/api/v1/connect"].is_object());
}

// =============================================================================
// Session Tests
// =============================================================================

#[tokio::test]
async fn test_connect_uses_configured_defaults() {
    let (_server, app) = setup().await;

    let (status, json) = send(&app, "POST", "/api/v1/connect", None, Some(json!({}))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["tenant"], "default_tenant");
    assert_eq!(json["database"], "default_database");
    assert_eq!(json["authenticated"], false);
    assert!(json.get("api_key").is_none());
}

#[tokio::test]
async fn test_connect_unknown_database() {
    let (_server, app) = setup().await;

    let (status, json) = send(
        &app,
        "POST",
        "/api/v1/connect",
        None,
        Some(json!({ "database": "missing" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["message"].as_str().unwrap().contains("default_database"));
}

#[tokio::test]
async fn test_connect_refused_when_not_ready() {
    let (server, app) = setup().await;
    server.set_ready(false);

    let (status, json) = send(&app, "POST", "/api/v1/connect", None, Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["code"], "NOT_READY");
}

#[tokio::test]
async fn test_connect_unreachable_server() {
    let (_server, app) = setup().await;

    let (status, json) = send(
        &app,
        "POST",
        "/api/v1/connect",
        None,
        Some(json!({ "server_url": "http://127.0.0.1:1" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["code"], "UPSTREAM_UNAVAILABLE");
}

#[tokio::test]
async fn test_requests_without_session_are_rejected() {
    let (_server, app) = setup().await;

    let (status, json) = send(&app, "GET", "/api/v1/collections", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], "UNAUTHORIZED");

    let (status, _) = send(
        &app,
        "GET",
        "/api/v1/collections",
        Some("00000000-0000-0000-0000-000000000000"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, "GET", "/api/v1/collections", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_disconnect_ends_session() {
    let (_server, app) = setup().await;
    let session = connect(&app).await;

    let (status, _) = send(&app, "POST", "/api/v1/disconnect", Some(&session), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, "GET", "/api/v1/session", Some(&session), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_switch_database() {
    let (_server, app) = setup().await;
    let session = connect(&app).await;
    create_collection(&app, &session, "in-default").await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/databases",
        Some(&session),
        Some(json!({ "name": "other" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, json) = send(
        &app,
        "PUT",
        "/api/v1/session/database",
        Some(&session),
        Some(json!({ "database": "other" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["database"], "other");

    let (_, json) = send(&app, "GET", "/api/v1/collections", Some(&session), None).await;
    assert_eq!(json["database"], "other");
    assert!(json["collections"].as_array().unwrap().is_empty());

    let (status, _) = send(
        &app,
        "PUT",
        "/api/v1/session/database",
        Some(&session),
        Some(json!({ "database": "nowhere" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Database Tests
// =============================================================================

#[tokio::test]
async fn test_database_lifecycle() {
    let (_server, app) = setup().await;
    let session = connect(&app).await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/databases",
        Some(&session),
        Some(json!({ "name": "scratch" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, json) = send(&app, "GET", "/api/v1/databases", Some(&session), None).await;
    let names: Vec<&str> = json["databases"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["name"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"scratch"));

    let (status, _) = send(
        &app,
        "DELETE",
        "/api/v1/databases/scratch",
        Some(&session),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_duplicate_database_is_upstream_error() {
    let (_server, app) = setup().await;
    let session = connect(&app).await;

    let (status, json) = send(
        &app,
        "POST",
        "/api/v1/databases",
        Some(&session),
        Some(json!({ "name": "default_database" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["code"], "REMOTE_ERROR");
    assert!(json["details"].as_str().unwrap().ends_with("answered 409"));
}

// =============================================================================
// Collection Tests
// =============================================================================

#[tokio::test]
async fn test_collection_lifecycle() {
    let (_server, app) = setup().await;
    let session = connect(&app).await;

    let (status, json) = send(
        &app,
        "POST",
        "/api/v1/collections",
        Some(&session),
        Some(json!({ "name": "manuals", "metadata": { "owner": "ops" } })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["name"], "manuals");
    assert_eq!(json["metadata"]["owner"], "ops");

    let (status, json) = send(&app, "GET", "/api/v1/collections/manuals", Some(&session), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["name"], "manuals");
    assert_eq!(json["count"], 0);

    let (status, _) = send(
        &app,
        "DELETE",
        "/api/v1/collections/manuals",
        Some(&session),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, "GET", "/api/v1/collections/manuals", Some(&session), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_collection_lists_available() {
    let (_server, app) = setup().await;
    let session = connect(&app).await;
    create_collection(&app, &session, "alpha").await;

    let (status, json) = send(&app, "GET", "/api/v1/collections/beta", Some(&session), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
    assert!(json["message"].as_str().unwrap().contains("alpha"));
}

#[tokio::test]
async fn test_empty_collection_name_rejected() {
    let (_server, app) = setup().await;
    let session = connect(&app).await;

    let (status, json) = send(
        &app,
        "POST",
        "/api/v1/collections",
        Some(&session),
        Some(json!({ "name": "  " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_remote_failure_maps_to_bad_gateway() {
    let (server, app) = setup().await;
    let session = connect(&app).await;

    server.fail_next(500, "boom");
    let (status, json) = send(&app, "GET", "/api/v1/collections", Some(&session), None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["code"], "REMOTE_ERROR");
    assert!(json["message"].as_str().unwrap().contains("boom"));
}

// =============================================================================
// Document and Search Tests
// =============================================================================

#[tokio::test]
async fn test_connect_add_and_search() {
    let (_server, app) = setup().await;
    let session = connect(&app).await;
    create_collection(&app, &session, "faq").await;

    let (status, json) = send(
        &app,
        "POST",
        "/api/v1/collections/faq/documents",
        Some(&session),
        Some(json!({
            "documents": [
                { "id": "reset", "text": "How to reset a password", "metadata": { "topic": "auth" } },
                { "id": "billing", "text": "Where to find invoices" },
                { "text": "Shipping times for orders" }
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "add failed: {json}");
    let ids = json["ids"].as_array().unwrap();
    assert_eq!(ids.len(), 3);
    assert_eq!(ids[0], "reset");
    assert_eq!(ids[2].as_str().unwrap().len(), 36);

    let (status, json) = send(
        &app,
        "POST",
        "/api/v1/collections/faq/search",
        Some(&session),
        Some(json!({ "query": "How to reset a password", "n_results": 3 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let results = json["results"].as_array().unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(results[0]["id"], "reset");
    assert_eq!(results[0]["metadata"]["topic"], "auth");

    let distances: Vec<f64> = results
        .iter()
        .map(|r| r["distance"].as_f64().unwrap())
        .collect();
    assert!(distances.windows(2).all(|w| w[0] <= w[1]));
}

#[tokio::test]
async fn test_search_with_filter() {
    let (_server, app) = setup().await;
    let session = connect(&app).await;
    create_collection(&app, &session, "notes").await;

    send(
        &app,
        "POST",
        "/api/v1/collections/notes/documents",
        Some(&session),
        Some(json!({
            "documents": [
                { "id": "a", "text": "first note", "metadata": { "kind": "x" } },
                { "id": "b", "text": "second note", "metadata": { "kind": "y" } }
            ]
        })),
    )
    .await;

    let (status, json) = send(
        &app,
        "POST",
        "/api/v1/collections/notes/search",
        Some(&session),
        Some(json!({ "query": "first note", "filter": { "kind": "y" } })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let results = json["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["id"], "b");
}

#[tokio::test]
async fn test_search_validation() {
    let (_server, app) = setup().await;
    let session = connect(&app).await;
    create_collection(&app, &session, "notes").await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/collections/notes/search",
        Some(&session),
        Some(json!({ "query": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/collections/notes/search",
        Some(&session),
        Some(json!({ "query": "hi", "n_results": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_document_pagination() {
    let (_server, app) = setup().await;
    let session = connect(&app).await;
    create_collection(&app, &session, "bulk").await;

    let documents: Vec<Value> = (0..25)
        .map(|i| json!({ "id": format!("doc-{i:02}"), "text": format!("document number {i}") }))
        .collect();
    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/collections/bulk/documents",
        Some(&session),
        Some(json!({ "documents": documents })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, json) = send(
        &app,
        "GET",
        "/api/v1/collections/bulk/documents?page=2&page_size=10",
        Some(&session),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total"], 25);
    assert_eq!(json["total_pages"], 3);
    assert_eq!(json["page"], 2);
    assert_eq!(json["documents"].as_array().unwrap().len(), 10);
    assert_eq!(json["documents"][0]["id"], "doc-10");

    let (_, json) = send(
        &app,
        "GET",
        "/api/v1/collections/bulk/documents?page=3&page_size=10",
        Some(&session),
        None,
    )
    .await;
    assert_eq!(json["documents"].as_array().unwrap().len(), 5);

    let (status, _) = send(
        &app,
        "GET",
        "/api/v1/collections/bulk/documents?page=0",
        Some(&session),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "GET",
        "/api/v1/collections/bulk/documents?page_size=101",
        Some(&session),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_and_delete_document() {
    let (_server, app) = setup().await;
    let session = connect(&app).await;
    create_collection(&app, &session, "edits").await;

    send(
        &app,
        "POST",
        "/api/v1/collections/edits/documents",
        Some(&session),
        Some(json!({ "documents": [{ "id": "d1", "text": "old text" }] })),
    )
    .await;

    let (status, json) = send(
        &app,
        "PUT",
        "/api/v1/collections/edits/documents/d1",
        Some(&session),
        Some(json!({ "text": "new text", "metadata": { "rev": 2 } })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["text"], "new text");

    let (_, json) = send(
        &app,
        "GET",
        "/api/v1/collections/edits/documents",
        Some(&session),
        None,
    )
    .await;
    assert_eq!(json["documents"][0]["text"], "new text");
    assert_eq!(json["documents"][0]["metadata"]["rev"], 2);

    let (status, _) = send(
        &app,
        "DELETE",
        "/api/v1/collections/edits/documents/d1",
        Some(&session),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, json) = send(&app, "GET", "/api/v1/collections/edits", Some(&session), None).await;
    assert_eq!(json["count"], 0);
}

#[tokio::test]
async fn test_empty_document_batch_rejected() {
    let (_server, app) = setup().await;
    let session = connect(&app).await;
    create_collection(&app, &session, "c").await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/collections/c/documents",
        Some(&session),
        Some(json!({ "documents": [] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/collections/c/documents",
        Some(&session),
        Some(json!({ "documents": [{ "text": "" }] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_text_operations_need_embedding_key() {
    let server = MockServer::start().await;
    let app = create_router(Arc::new(AppState::new(config_for(&server))));
    let session = connect(&app).await;
    create_collection(&app, &session, "c").await;

    let (status, json) = send(
        &app,
        "POST",
        "/api/v1/collections/c/search",
        Some(&session),
        Some(json!({ "query": "hello" })),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "INTERNAL_ERROR");
}

#[tokio::test]
async fn test_sessions_have_separate_caches() {
    let (server, app) = setup().await;
    let first = connect(&app).await;
    let second = connect(&app).await;
    create_collection(&app, &first, "shared").await;

    // The first session cached the id on create; the second must list
    server.clear_requests();
    send(&app, "GET", "/api/v1/collections/shared", Some(&first), None).await;
    assert_eq!(server.list_collection_calls(), 0);

    send(&app, "GET", "/api/v1/collections/shared", Some(&second), None).await;
    assert_eq!(server.list_collection_calls(), 1);
}

#[tokio::test]
async fn test_document_text_is_trimmed_on_add_and_update() {
    let (server, app) = setup().await;
    let session = connect(&app).await;
    create_collection(&app, &session, "trim").await;

    send(
        &app,
        "POST",
        "/api/v1/collections/trim/documents",
        Some(&session),
        Some(json!({ "documents": [{ "id": "d1", "text": "  padded text \n" }] })),
    )
    .await;

    let (_, json) = send(
        &app,
        "GET",
        "/api/v1/collections/trim/documents",
        Some(&session),
        None,
    )
    .await;
    assert_eq!(json["documents"][0]["text"], "padded text");
    let embedded: Vec<Value> = server
        .requests_to(axum::http::Method::POST, "/v1/embeddings")
        .into_iter()
        .filter_map(|r| r.body.map(|b| b["input"].clone()))
        .collect();
    assert_eq!(embedded, vec![json!("padded text")]);

    let (status, json) = send(
        &app,
        "PUT",
        "/api/v1/collections/trim/documents/d1",
        Some(&session),
        Some(json!({ "text": "\tnew text  " })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["text"], "new text");

    let (_, json) = send(
        &app,
        "GET",
        "/api/v1/collections/trim/documents",
        Some(&session),
        None,
    )
    .await;
    assert_eq!(json["documents"][0]["text"], "new text");
}
