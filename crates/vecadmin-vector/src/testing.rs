//! In-process mock of the vector store and embedding APIs
//!
//! Serves the same resource tree as a real server from memory and records
//! every request so tests can assert on what went over the wire.
//!
//! ```ignore
//! let server = MockServer::start().await;
//! let client = VectorStoreClient::new(server.connection());
//! ```
//!
//! Author: hephaex@gmail.com

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json, Router,
};
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};
use vecadmin_core::Connection;

pub const MOCK_TENANT: &str = "default_tenant";
pub const MOCK_DATABASE: &str = "default_database";
pub const MOCK_EMBEDDING_KEY: &str = "test-embedding-key";

/// Dimensionality of [`mock_embedding`] vectors
pub const MOCK_DIMENSION: usize = 8;

/// One request as seen by the mock
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub authorization: Option<String>,
    /// Raw body text
    pub raw_body: String,
    /// Body parsed as JSON, when it was JSON
    pub body: Option<Value>,
}

#[derive(Debug, Clone)]
struct MockDocument {
    id: String,
    text: Option<String>,
    metadata: Option<Value>,
    embedding: Vec<f32>,
}

#[derive(Debug, Clone)]
struct MockCollection {
    id: String,
    name: String,
    metadata: Option<Value>,
    documents: Vec<MockDocument>,
}

impl MockCollection {
    fn to_json(&self) -> Value {
        json!({ "id": self.id, "name": self.name, "metadata": self.metadata })
    }
}

#[derive(Debug, Default)]
struct MockState {
    /// tenant -> database -> collections
    tenants: BTreeMap<String, BTreeMap<String, Vec<MockCollection>>>,
    requests: Vec<RecordedRequest>,
    failures: VecDeque<(StatusCode, String)>,
    not_ready: bool,
}

type SharedState = Arc<Mutex<MockState>>;

/// Handle to a running mock server
#[derive(Clone)]
pub struct MockServer {
    addr: SocketAddr,
    state: SharedState,
}

impl MockServer {
    /// Bind to an ephemeral port and serve in the background
    ///
    /// Starts with one tenant holding one empty database.
    pub async fn start() -> Self {
        let mut state = MockState::default();
        state
            .tenants
            .entry(MOCK_TENANT.to_string())
            .or_default()
            .insert(MOCK_DATABASE.to_string(), Vec::new());
        let state = Arc::new(Mutex::new(state));

        let app = Router::new().fallback(handle).with_state(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .unwrap_or_else(|e| panic!("mock server bind failed: {e}"));
        let addr = listener
            .local_addr()
            .unwrap_or_else(|e| panic!("mock server address unavailable: {e}"));

        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { addr, state }
    }

    /// Base address of the vector store API
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Base address of the embedding API
    pub fn embedding_url(&self) -> String {
        format!("http://{}/v1", self.addr)
    }

    /// Connection to the default tenant and database
    pub fn connection(&self) -> Connection {
        Connection::new(self.url(), MOCK_TENANT, MOCK_DATABASE)
    }

    /// Everything received so far
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.lock().requests.clone()
    }

    /// Requests matching `method` whose path ends with `suffix`
    pub fn requests_to(&self, method: Method, suffix: &str) -> Vec<RecordedRequest> {
        self.lock()
            .requests
            .iter()
            .filter(|r| r.method == method && r.path.ends_with(suffix))
            .cloned()
            .collect()
    }

    /// Number of collection listings served
    pub fn list_collection_calls(&self) -> usize {
        self.requests_to(Method::GET, "/collections").len()
    }

    pub fn clear_requests(&self) {
        self.lock().requests.clear();
    }

    /// Answer the next request with `status` and `body` instead of serving it
    pub fn fail_next(&self, status: u16, body: impl Into<String>) {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        self.lock().failures.push_back((status, body.into()));
    }

    /// Toggle the readiness flag reported by the health check
    pub fn set_ready(&self, ready: bool) {
        self.lock().not_ready = !ready;
    }

    /// Rename a collection behind the client's back
    pub fn rename_collection(&self, database: &str, from: &str, to: &str) {
        let mut state = self.lock();
        if let Some(collection) = state
            .tenants
            .get_mut(MOCK_TENANT)
            .and_then(|dbs| dbs.get_mut(database))
            .and_then(|cols| cols.iter_mut().find(|c| c.name == from))
        {
            collection.name = to.to_string();
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Deterministic embedding: character histogram folded into
/// [`MOCK_DIMENSION`] buckets and normalized
pub fn mock_embedding(text: &str) -> Vec<f32> {
    let mut vector = vec![0.0f32; MOCK_DIMENSION];
    for (i, byte) in text.bytes().enumerate() {
        vector[(byte as usize + i) % MOCK_DIMENSION] += 1.0;
    }
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        vector.iter_mut().for_each(|v| *v /= norm);
    }
    vector
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

fn error(status: StatusCode, message: impl Into<String>) -> Response {
    let message = message.into();
    (status, Json(json!({ "error": status.as_str(), "message": message }))).into_response()
}

async fn handle(
    State(state): State<SharedState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let raw_body = String::from_utf8_lossy(&body).into_owned();
    let parsed: Option<Value> = serde_json::from_str(&raw_body).ok();
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let mut state = state.lock().unwrap_or_else(|e| e.into_inner());
    state.requests.push(RecordedRequest {
        method: method.clone(),
        path: uri.path().to_string(),
        authorization: authorization.clone(),
        raw_body,
        body: parsed.clone(),
    });

    if let Some((status, body)) = state.failures.pop_front() {
        return (status, [(header::CONTENT_TYPE, "application/json")], body).into_response();
    }

    let segments: Vec<&str> = uri.path().trim_matches('/').split('/').collect();
    let body = parsed.unwrap_or(Value::Null);

    match (method, segments.as_slice()) {
        (Method::POST, ["v1", "embeddings"]) => embeddings(authorization.as_deref(), &body),
        (Method::GET, ["api", "v2", "healthcheck"]) => Json(json!({
            "is_executor_ready": !state.not_ready,
            "is_log_client_ready": true
        }))
        .into_response(),
        (method, ["api", "v2", "tenants", tenant, "databases", rest @ ..]) => {
            route_tenant(&mut state, method, tenant, rest, body)
        }
        _ => error(StatusCode::NOT_FOUND, format!("no route for {}", uri.path())),
    }
}

fn embeddings(authorization: Option<&str>, body: &Value) -> Response {
    let expected = format!("Bearer {MOCK_EMBEDDING_KEY}");
    if authorization != Some(expected.as_str()) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": { "message": "Incorrect API key provided" } })),
        )
            .into_response();
    }
    let Some(input) = body.get("input").and_then(Value::as_str) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": { "message": "input is required" } })),
        )
            .into_response();
    };

    Json(json!({
        "object": "list",
        "data": [{ "object": "embedding", "index": 0, "embedding": mock_embedding(input) }],
        "model": body.get("model").cloned().unwrap_or(Value::Null)
    }))
    .into_response()
}

fn route_tenant(
    state: &mut MockState,
    method: Method,
    tenant: &str,
    rest: &[&str],
    body: Value,
) -> Response {
    let Some(databases) = state.tenants.get_mut(tenant) else {
        return error(StatusCode::NOT_FOUND, format!("tenant {tenant} not found"));
    };

    match (method, rest) {
        (Method::GET, []) => Json(
            databases
                .keys()
                .map(|name| json!({ "name": name, "tenant": tenant }))
                .collect::<Vec<_>>(),
        )
        .into_response(),
        (Method::POST, []) => {
            let Some(name) = body.get("name").and_then(Value::as_str) else {
                return error(StatusCode::UNPROCESSABLE_ENTITY, "name is required");
            };
            if databases.contains_key(name) {
                return error(StatusCode::CONFLICT, format!("database {name} already exists"));
            }
            databases.insert(name.to_string(), Vec::new());
            Json(json!({})).into_response()
        }
        (Method::DELETE, [name]) => match databases.remove(*name) {
            Some(_) => Json(json!({})).into_response(),
            None => error(StatusCode::NOT_FOUND, format!("database {name} not found")),
        },
        (method, [database, "collections", rest @ ..]) => match databases.get_mut(*database) {
            Some(collections) => route_collections(collections, method, rest, body),
            None => error(StatusCode::NOT_FOUND, format!("database {database} not found")),
        },
        _ => error(StatusCode::NOT_FOUND, "unknown database route"),
    }
}

fn route_collections(
    collections: &mut Vec<MockCollection>,
    method: Method,
    rest: &[&str],
    body: Value,
) -> Response {
    match (method, rest) {
        (Method::GET, []) => {
            Json(collections.iter().map(MockCollection::to_json).collect::<Vec<_>>())
                .into_response()
        }
        (Method::POST, []) => {
            let Some(name) = body.get("name").and_then(Value::as_str) else {
                return error(StatusCode::UNPROCESSABLE_ENTITY, "name is required");
            };
            if collections.iter().any(|c| c.name == name) {
                return error(StatusCode::CONFLICT, format!("collection {name} already exists"));
            }
            let collection = MockCollection {
                id: uuid::Uuid::new_v4().to_string(),
                name: name.to_string(),
                metadata: body.get("metadata").cloned(),
                documents: Vec::new(),
            };
            let response = collection.to_json();
            collections.push(collection);
            Json(response).into_response()
        }
        (method, [id, action @ ..]) => {
            let Some(index) = collections.iter().position(|c| c.id == *id) else {
                return error(StatusCode::NOT_FOUND, format!("collection {id} not found"));
            };
            match (method, action) {
                (Method::GET, []) => Json(collections[index].to_json()).into_response(),
                (Method::DELETE, []) => {
                    collections.remove(index);
                    Json(json!({})).into_response()
                }
                (method, [action]) => {
                    collection_action(&mut collections[index], method, action, body)
                }
                _ => error(StatusCode::NOT_FOUND, "unknown collection route"),
            }
        }
        _ => error(StatusCode::NOT_FOUND, "unknown collections route"),
    }
}

fn string_array(body: &Value, key: &str) -> Vec<String> {
    body.get(key)
        .and_then(Value::as_array)
        .map(|values| {
            values
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

fn float_vector(value: &Value) -> Vec<f32> {
    value
        .as_array()
        .map(|values| {
            values
                .iter()
                .filter_map(Value::as_f64)
                .map(|v| v as f32)
                .collect()
        })
        .unwrap_or_default()
}

fn matches_filter(document: &MockDocument, filter: Option<&Map<String, Value>>) -> bool {
    let Some(filter) = filter else {
        return true;
    };
    let metadata = document.metadata.as_ref().and_then(Value::as_object);
    filter
        .iter()
        .all(|(key, expected)| metadata.and_then(|m| m.get(key)) == Some(expected))
}

fn collection_action(
    collection: &mut MockCollection,
    method: Method,
    action: &str,
    body: Value,
) -> Response {
    match (method, action) {
        (Method::GET, "count") => Json(collection.documents.len()).into_response(),
        (Method::POST, "add") | (Method::POST, "update") => {
            let ids = string_array(&body, "ids");
            let embeddings = body.get("embeddings").and_then(Value::as_array);
            let texts = body.get("documents").and_then(Value::as_array);
            let metadatas = body.get("metadatas").and_then(Value::as_array);

            if embeddings.map_or(0, Vec::len) != ids.len() {
                return error(
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "ids and embeddings must have the same length",
                );
            }

            for (i, id) in ids.iter().enumerate() {
                let document = MockDocument {
                    id: id.clone(),
                    text: texts
                        .and_then(|t| t.get(i))
                        .and_then(Value::as_str)
                        .map(str::to_string),
                    metadata: metadatas
                        .and_then(|m| m.get(i))
                        .filter(|m| !m.is_null())
                        .cloned(),
                    embedding: embeddings
                        .and_then(|e| e.get(i))
                        .map(float_vector)
                        .unwrap_or_default(),
                };
                let existing = collection.documents.iter().position(|d| d.id == *id);
                match (action, existing) {
                    ("add", Some(_)) => {
                        return error(StatusCode::CONFLICT, format!("document {id} already exists"))
                    }
                    ("add", None) => collection.documents.push(document),
                    (_, Some(index)) => collection.documents[index] = document,
                    (_, None) => {
                        return error(StatusCode::NOT_FOUND, format!("document {id} not found"))
                    }
                }
            }
            Json(json!({})).into_response()
        }
        (Method::POST, "get") => {
            let ids = string_array(&body, "ids");
            let limit = body
                .get("limit")
                .and_then(Value::as_u64)
                .map_or(usize::MAX, |l| l as usize);
            let offset = body.get("offset").and_then(Value::as_u64).unwrap_or(0) as usize;

            let selected: Vec<&MockDocument> = collection
                .documents
                .iter()
                .filter(|d| ids.is_empty() || ids.contains(&d.id))
                .skip(offset)
                .take(limit)
                .collect();

            Json(json!({
                "ids": selected.iter().map(|d| &d.id).collect::<Vec<_>>(),
                "documents": selected.iter().map(|d| &d.text).collect::<Vec<_>>(),
                "metadatas": selected.iter().map(|d| &d.metadata).collect::<Vec<_>>(),
            }))
            .into_response()
        }
        (Method::POST, "query") => {
            let n_results = body
                .get("n_results")
                .and_then(Value::as_u64)
                .unwrap_or(10) as usize;
            let filter = body.get("where").and_then(Value::as_object);
            let queries: Vec<Vec<f32>> = body
                .get("query_embeddings")
                .and_then(Value::as_array)
                .map(|q| q.iter().map(float_vector).collect())
                .unwrap_or_default();

            let mut ids = Vec::new();
            let mut documents = Vec::new();
            let mut metadatas = Vec::new();
            let mut distances = Vec::new();
            for query in &queries {
                let mut hits: Vec<(f32, &MockDocument)> = collection
                    .documents
                    .iter()
                    .filter(|d| matches_filter(d, filter))
                    .map(|d| (squared_l2(query, &d.embedding), d))
                    .collect();
                hits.sort_by(|a, b| a.0.total_cmp(&b.0));
                hits.truncate(n_results);

                ids.push(hits.iter().map(|(_, d)| d.id.clone()).collect::<Vec<_>>());
                documents.push(hits.iter().map(|(_, d)| d.text.clone()).collect::<Vec<_>>());
                metadatas.push(hits.iter().map(|(_, d)| d.metadata.clone()).collect::<Vec<_>>());
                distances.push(hits.iter().map(|(s, _)| *s).collect::<Vec<_>>());
            }

            Json(json!({
                "ids": ids,
                "documents": documents,
                "metadatas": metadatas,
                "distances": distances,
            }))
            .into_response()
        }
        (Method::POST, "delete") => {
            let ids = string_array(&body, "ids");
            collection.documents.retain(|d| !ids.contains(&d.id));
            Json(json!({})).into_response()
        }
        _ => error(StatusCode::NOT_FOUND, format!("unknown action {action}")),
    }
}
