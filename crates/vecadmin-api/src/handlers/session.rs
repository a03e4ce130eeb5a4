//! Session handlers: connect, disconnect, inspect, switch database
//!
//! Author: hephaex@gmail.com

use super::require_non_empty;
use crate::error::AppError;
use crate::middleware::ActiveSession;
use crate::state::{AppState, Session};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use vecadmin_core::Connection;
use vecadmin_vector::VectorStoreClient;

/// Connect request; omitted fields fall back to the configured defaults
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ConnectRequest {
    #[schema(example = "http://localhost:8000")]
    pub server_url: Option<String>,
    pub api_key: Option<String>,
    #[schema(example = "default_tenant")]
    pub tenant: Option<String>,
    #[schema(example = "default_database")]
    pub database: Option<String>,
}

/// Switch database request
#[derive(Debug, Deserialize, ToSchema)]
pub struct SwitchDatabaseRequest {
    pub database: String,
}

/// Session details; the credential itself is never echoed
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub session_id: String,
    pub server_url: String,
    pub tenant: String,
    pub database: String,
    /// Whether a bearer credential is attached
    pub authenticated: bool,
    pub connected_at: String,
}

impl From<&Session> for SessionResponse {
    fn from(session: &Session) -> Self {
        let connection = session.connection();
        Self {
            session_id: session.id.to_string(),
            server_url: connection.base_url().to_string(),
            tenant: connection.tenant.clone(),
            database: connection.database.clone(),
            authenticated: connection.api_key.is_some(),
            connected_at: session.connected_at.to_rfc3339(),
        }
    }
}

fn pick(requested: Option<String>, default: &str) -> String {
    requested
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Fail unless `database` is listed under the client's tenant
async fn ensure_database(client: &VectorStoreClient, database: &str) -> Result<(), AppError> {
    let tenant = client.connection().tenant.as_str();
    let databases = client.list_databases(tenant).await?;

    if databases.iter().any(|d| d.name == database) {
        return Ok(());
    }

    let available: Vec<String> = databases.into_iter().map(|d| d.name).collect();
    Err(AppError::NotFound(format!(
        "Database '{database}' not found in tenant '{tenant}' (available: [{}])",
        available.join(", ")
    )))
}

/// Open a session against a vector store
#[utoipa::path(
    post,
    path = "/api/v1/connect",
    tag = "session",
    request_body = ConnectRequest,
    responses(
        (status = 201, description = "Session opened", body = SessionResponse),
        (status = 404, description = "Database not found", body = crate::error::ApiError),
        (status = 502, description = "Vector store unreachable or not ready", body = crate::error::ApiError)
    )
)]
pub async fn connect(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ConnectRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.increment_requests();

    let defaults = &state.config.vector_db;
    let api_key = request.api_key.or_else(|| defaults.api_key.clone());
    let connection = Connection::new(
        pick(request.server_url, &defaults.url),
        pick(request.tenant, &defaults.tenant),
        pick(request.database, &defaults.database),
    )
    .with_api_key(api_key);

    let client = state.client_for(connection);
    let server = client.connection().base_url().to_string();

    match client.health_check().await {
        Ok(true) => {}
        Ok(false) => {
            tracing::warn!(server = %server, "Vector store reports not ready");
            return Err(AppError::Upstream {
                code: "NOT_READY",
                message: format!("Vector store at {server} is not ready"),
                details: None,
            });
        }
        Err(e) => {
            tracing::warn!(server = %server, error = %e, "Vector store health probe failed");
            return Err(e.into());
        }
    }

    let database = client.connection().database.clone();
    ensure_database(&client, &database).await?;

    let session = state.open_session(client).await;
    let response = SessionResponse::from(&*session.lock().await);
    Ok((StatusCode::CREATED, Json(response)))
}

/// Close the current session
#[utoipa::path(
    post,
    path = "/api/v1/disconnect",
    tag = "session",
    params(("x-session-id" = String, Header, description = "Session id")),
    responses(
        (status = 204, description = "Session closed"),
        (status = 401, description = "No session", body = crate::error::ApiError)
    )
)]
pub async fn disconnect(
    State(state): State<Arc<AppState>>,
    Extension(active): Extension<ActiveSession>,
) -> impl IntoResponse {
    state.close_session(&active.id).await;
    StatusCode::NO_CONTENT
}

/// Describe the current session
#[utoipa::path(
    get,
    path = "/api/v1/session",
    tag = "session",
    params(("x-session-id" = String, Header, description = "Session id")),
    responses(
        (status = 200, description = "Session details", body = SessionResponse),
        (status = 401, description = "No session", body = crate::error::ApiError)
    )
)]
pub async fn get_session(Extension(active): Extension<ActiveSession>) -> impl IntoResponse {
    let session = active.session.lock().await;
    Json(SessionResponse::from(&*session))
}

/// Point the session at another database of the same tenant
///
/// The session gets a new client, so its collection id cache starts empty.
#[utoipa::path(
    put,
    path = "/api/v1/session/database",
    tag = "session",
    params(("x-session-id" = String, Header, description = "Session id")),
    request_body = SwitchDatabaseRequest,
    responses(
        (status = 200, description = "Database switched", body = SessionResponse),
        (status = 400, description = "Empty database name", body = crate::error::ApiError),
        (status = 404, description = "Database not found", body = crate::error::ApiError)
    )
)]
pub async fn switch_database(
    State(state): State<Arc<AppState>>,
    Extension(active): Extension<ActiveSession>,
    Json(request): Json<SwitchDatabaseRequest>,
) -> Result<impl IntoResponse, AppError> {
    let database = require_non_empty("database", &request.database)?;

    let mut session = active.session.lock().await;
    ensure_database(&session.client, database).await?;

    let connection = session.connection().for_database(database);
    session.client = state.client_for(connection);
    tracing::info!(session = %session.id, database, "Session switched database");

    Ok(Json(SessionResponse::from(&*session)))
}
