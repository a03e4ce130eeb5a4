//! Document management handlers
//!
//! Author: hephaex@gmail.com

use super::{require_non_empty, total_pages, Page};
use crate::error::AppError;
use crate::middleware::ActiveSession;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use vecadmin_core::{Document, DocumentBatch, Metadata};

/// Stored document (embeddings are not returned)
#[derive(Debug, Serialize, ToSchema)]
pub struct DocumentResponse {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: String,
    pub text: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<Metadata>,
}

impl From<Document> for DocumentResponse {
    fn from(document: Document) -> Self {
        Self {
            id: document.id,
            text: document.text,
            metadata: document.metadata,
        }
    }
}

/// One page of a collection
#[derive(Debug, Serialize, ToSchema)]
pub struct DocumentListResponse {
    pub documents: Vec<DocumentResponse>,
    /// Documents in the collection
    pub total: u64,
    /// Current page (1-indexed)
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u64,
}

/// Query parameters for document listing
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListDocumentsQuery {
    /// Page number (1-indexed)
    #[param(default = 1)]
    pub page: Option<u32>,

    /// Items per page (at most 100)
    #[param(default = 20)]
    pub page_size: Option<u32>,
}

/// Document to add; the id is generated when absent
#[derive(Debug, Deserialize, ToSchema)]
pub struct NewDocument {
    pub id: Option<String>,
    pub text: String,
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<Metadata>,
}

/// Add documents request
#[derive(Debug, Deserialize, ToSchema)]
pub struct AddDocumentsRequest {
    pub documents: Vec<NewDocument>,
}

/// Ids of the added documents, in request order
#[derive(Debug, Serialize, ToSchema)]
pub struct AddDocumentsResponse {
    pub ids: Vec<String>,
}

/// Update document request
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateDocumentRequest {
    pub text: String,
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<Metadata>,
}

/// List documents page by page
#[utoipa::path(
    get,
    path = "/api/v1/collections/{name}/documents",
    tag = "documents",
    params(
        ("name" = String, Path, description = "Collection name"),
        ("x-session-id" = String, Header, description = "Session id"),
        ListDocumentsQuery
    ),
    responses(
        (status = 200, description = "Document page", body = DocumentListResponse),
        (status = 400, description = "Invalid paging", body = crate::error::ApiError),
        (status = 404, description = "Unknown collection", body = crate::error::ApiError)
    )
)]
pub async fn list_documents(
    Extension(active): Extension<ActiveSession>,
    Path(name): Path<String>,
    Query(params): Query<ListDocumentsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let page = Page::from_query(params.page, params.page_size)?;

    let mut session = active.session.lock().await;
    let total = session.client.count_documents(&name).await?;
    let result = session
        .client
        .get_documents(&name, &[], page.limit(), page.offset())
        .await?;

    Ok(Json(DocumentListResponse {
        documents: result
            .into_documents()
            .into_iter()
            .map(DocumentResponse::from)
            .collect(),
        total,
        page: page.page,
        page_size: page.page_size,
        total_pages: total_pages(total, page.page_size),
    }))
}

/// Embed and add documents
#[utoipa::path(
    post,
    path = "/api/v1/collections/{name}/documents",
    tag = "documents",
    params(
        ("name" = String, Path, description = "Collection name"),
        ("x-session-id" = String, Header, description = "Session id")
    ),
    request_body = AddDocumentsRequest,
    responses(
        (status = 201, description = "Documents added", body = AddDocumentsResponse),
        (status = 400, description = "Empty batch or text", body = crate::error::ApiError),
        (status = 404, description = "Unknown collection", body = crate::error::ApiError),
        (status = 502, description = "Vector store or embedding error", body = crate::error::ApiError)
    )
)]
pub async fn add_documents(
    State(state): State<Arc<AppState>>,
    Extension(active): Extension<ActiveSession>,
    Path(name): Path<String>,
    Json(request): Json<AddDocumentsRequest>,
) -> Result<impl IntoResponse, AppError> {
    if request.documents.is_empty() {
        return Err(AppError::bad_request("documents must not be empty"));
    }
    for document in &request.documents {
        require_non_empty("text", &document.text)?;
    }
    let embedder = state.embedder()?;

    let mut session = active.session.lock().await;
    let mut batch = DocumentBatch::new();
    for document in request.documents {
        let text = document.text.trim();
        let embedding = embedder.embed(text).await?;
        let id = document
            .id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        batch.push(id, text, embedding, document.metadata);
    }

    session.client.add_documents(&name, &batch).await?;
    tracing::info!(
        session = %session.id,
        collection = %name,
        count = batch.len(),
        "Documents added"
    );

    Ok((
        StatusCode::CREATED,
        Json(AddDocumentsResponse { ids: batch.ids }),
    ))
}

/// Re-embed and update one document
#[utoipa::path(
    put,
    path = "/api/v1/collections/{name}/documents/{id}",
    tag = "documents",
    params(
        ("name" = String, Path, description = "Collection name"),
        ("id" = String, Path, description = "Document id"),
        ("x-session-id" = String, Header, description = "Session id")
    ),
    request_body = UpdateDocumentRequest,
    responses(
        (status = 200, description = "Document updated", body = DocumentResponse),
        (status = 400, description = "Empty text", body = crate::error::ApiError),
        (status = 404, description = "Unknown collection", body = crate::error::ApiError)
    )
)]
pub async fn update_document(
    State(state): State<Arc<AppState>>,
    Extension(active): Extension<ActiveSession>,
    Path((name, id)): Path<(String, String)>,
    Json(request): Json<UpdateDocumentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let text = require_non_empty("text", &request.text)?.to_string();
    let embedder = state.embedder()?;

    let mut session = active.session.lock().await;
    let embedding = embedder.embed(&text).await?;

    let mut batch = DocumentBatch::new();
    batch.push(id.as_str(), text.as_str(), embedding, request.metadata.clone());
    session.client.update_documents(&name, &batch).await?;

    Ok(Json(DocumentResponse {
        id,
        text: Some(text),
        metadata: request.metadata.filter(|m| !m.is_empty()),
    }))
}

/// Delete one document
#[utoipa::path(
    delete,
    path = "/api/v1/collections/{name}/documents/{id}",
    tag = "documents",
    params(
        ("name" = String, Path, description = "Collection name"),
        ("id" = String, Path, description = "Document id"),
        ("x-session-id" = String, Header, description = "Session id")
    ),
    responses(
        (status = 204, description = "Document deleted"),
        (status = 404, description = "Unknown collection", body = crate::error::ApiError)
    )
)]
pub async fn delete_document(
    Extension(active): Extension<ActiveSession>,
    Path((name, id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let mut session = active.session.lock().await;
    session.client.delete_documents(&name, &[id]).await?;

    Ok(StatusCode::NO_CONTENT)
}
