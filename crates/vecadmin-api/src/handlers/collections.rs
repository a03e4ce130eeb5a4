//! Collection handlers
//!
//! Author: hephaex@gmail.com

use super::require_non_empty;
use crate::error::AppError;
use crate::middleware::ActiveSession;
use axum::{extract::Path, http::StatusCode, response::IntoResponse, Extension, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use vecadmin_core::{CollectionInfo, Metadata};

/// Collection entry
#[derive(Debug, Serialize, ToSchema)]
pub struct CollectionResponse {
    pub id: String,
    #[schema(example = "manuals")]
    pub name: String,
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<Metadata>,
}

impl From<CollectionInfo> for CollectionResponse {
    fn from(info: CollectionInfo) -> Self {
        Self {
            id: info.id,
            name: info.name,
            metadata: info.metadata,
        }
    }
}

/// Collections of the session's database
#[derive(Debug, Serialize, ToSchema)]
pub struct CollectionListResponse {
    pub database: String,
    pub collections: Vec<CollectionResponse>,
}

/// Collection with its document count
#[derive(Debug, Serialize, ToSchema)]
pub struct CollectionDetailResponse {
    #[serde(flatten)]
    pub collection: CollectionResponse,
    pub count: u64,
}

/// Create collection request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCollectionRequest {
    pub name: String,
    /// Empty metadata is treated as none
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<Metadata>,
}

/// List collections
///
/// Listing also rebuilds the session's collection id cache.
#[utoipa::path(
    get,
    path = "/api/v1/collections",
    tag = "collections",
    params(("x-session-id" = String, Header, description = "Session id")),
    responses(
        (status = 200, description = "Collection list", body = CollectionListResponse),
        (status = 401, description = "No session", body = crate::error::ApiError),
        (status = 502, description = "Vector store error", body = crate::error::ApiError)
    )
)]
pub async fn list_collections(
    Extension(active): Extension<ActiveSession>,
) -> Result<impl IntoResponse, AppError> {
    let mut session = active.session.lock().await;
    let collections = session.client.refresh_collections().await?;

    Ok(Json(CollectionListResponse {
        database: session.connection().database.clone(),
        collections: collections
            .into_iter()
            .map(CollectionResponse::from)
            .collect(),
    }))
}

/// Create a collection
#[utoipa::path(
    post,
    path = "/api/v1/collections",
    tag = "collections",
    params(("x-session-id" = String, Header, description = "Session id")),
    request_body = CreateCollectionRequest,
    responses(
        (status = 201, description = "Collection created", body = CollectionResponse),
        (status = 400, description = "Empty name", body = crate::error::ApiError),
        (status = 502, description = "Vector store error", body = crate::error::ApiError)
    )
)]
pub async fn create_collection(
    Extension(active): Extension<ActiveSession>,
    Json(request): Json<CreateCollectionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let name = require_non_empty("name", &request.name)?;

    let mut session = active.session.lock().await;
    let collection = session
        .client
        .create_collection(name, request.metadata.as_ref())
        .await?;
    tracing::info!(session = %session.id, collection = name, "Collection created");

    Ok((
        StatusCode::CREATED,
        Json(CollectionResponse::from(collection)),
    ))
}

/// Get a collection and its document count
#[utoipa::path(
    get,
    path = "/api/v1/collections/{name}",
    tag = "collections",
    params(
        ("name" = String, Path, description = "Collection name"),
        ("x-session-id" = String, Header, description = "Session id")
    ),
    responses(
        (status = 200, description = "Collection details", body = CollectionDetailResponse),
        (status = 404, description = "Unknown collection", body = crate::error::ApiError)
    )
)]
pub async fn get_collection(
    Extension(active): Extension<ActiveSession>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let mut session = active.session.lock().await;
    let collection = session.client.get_collection(&name).await?;
    let count = session.client.count_documents(&name).await?;

    Ok(Json(CollectionDetailResponse {
        collection: collection.into(),
        count,
    }))
}

/// Delete a collection
#[utoipa::path(
    delete,
    path = "/api/v1/collections/{name}",
    tag = "collections",
    params(
        ("name" = String, Path, description = "Collection name"),
        ("x-session-id" = String, Header, description = "Session id")
    ),
    responses(
        (status = 204, description = "Collection deleted"),
        (status = 404, description = "Unknown collection", body = crate::error::ApiError)
    )
)]
pub async fn delete_collection(
    Extension(active): Extension<ActiveSession>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let mut session = active.session.lock().await;
    session.client.delete_collection(&name).await?;
    tracing::info!(session = %session.id, collection = %name, "Collection deleted");

    Ok(StatusCode::NO_CONTENT)
}
