//! Database handlers
//!
//! Author: hephaex@gmail.com

use super::require_non_empty;
use crate::error::AppError;
use crate::middleware::ActiveSession;
use axum::{
    extract::Path,
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use vecadmin_core::DatabaseInfo;

/// Database entry
#[derive(Debug, Serialize, ToSchema)]
pub struct DatabaseResponse {
    #[schema(example = "default_database")]
    pub name: String,
    pub id: Option<String>,
    pub tenant: Option<String>,
}

impl From<DatabaseInfo> for DatabaseResponse {
    fn from(info: DatabaseInfo) -> Self {
        Self {
            name: info.name,
            id: info.id,
            tenant: info.tenant,
        }
    }
}

/// Databases of the session's tenant
#[derive(Debug, Serialize, ToSchema)]
pub struct DatabaseListResponse {
    pub tenant: String,
    pub databases: Vec<DatabaseResponse>,
}

/// Create database request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateDatabaseRequest {
    pub name: String,
}

/// List the databases of the session's tenant
#[utoipa::path(
    get,
    path = "/api/v1/databases",
    tag = "databases",
    params(("x-session-id" = String, Header, description = "Session id")),
    responses(
        (status = 200, description = "Database list", body = DatabaseListResponse),
        (status = 401, description = "No session", body = crate::error::ApiError),
        (status = 502, description = "Vector store error", body = crate::error::ApiError)
    )
)]
pub async fn list_databases(
    Extension(active): Extension<ActiveSession>,
) -> Result<impl IntoResponse, AppError> {
    let session = active.session.lock().await;
    let tenant = session.connection().tenant.clone();
    let databases = session.client.list_databases(&tenant).await?;

    Ok(Json(DatabaseListResponse {
        tenant,
        databases: databases.into_iter().map(DatabaseResponse::from).collect(),
    }))
}

/// Create a database under the session's tenant
#[utoipa::path(
    post,
    path = "/api/v1/databases",
    tag = "databases",
    params(("x-session-id" = String, Header, description = "Session id")),
    request_body = CreateDatabaseRequest,
    responses(
        (status = 201, description = "Database created"),
        (status = 400, description = "Empty name", body = crate::error::ApiError),
        (status = 502, description = "Vector store error", body = crate::error::ApiError)
    )
)]
pub async fn create_database(
    Extension(active): Extension<ActiveSession>,
    Json(request): Json<CreateDatabaseRequest>,
) -> Result<impl IntoResponse, AppError> {
    let name = require_non_empty("name", &request.name)?;

    let session = active.session.lock().await;
    session.client.create_database(name).await?;
    tracing::info!(session = %session.id, database = name, "Database created");

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "name": name })),
    ))
}

/// Delete a database of the session's tenant
#[utoipa::path(
    delete,
    path = "/api/v1/databases/{name}",
    tag = "databases",
    params(
        ("name" = String, Path, description = "Database name"),
        ("x-session-id" = String, Header, description = "Session id")
    ),
    responses(
        (status = 204, description = "Database deleted"),
        (status = 502, description = "Vector store error", body = crate::error::ApiError)
    )
)]
pub async fn delete_database(
    Extension(active): Extension<ActiveSession>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let name = require_non_empty("name", &name)?;

    let session = active.session.lock().await;
    session.client.delete_database(name).await?;
    tracing::info!(session = %session.id, database = name, "Database deleted");

    Ok(StatusCode::NO_CONTENT)
}
