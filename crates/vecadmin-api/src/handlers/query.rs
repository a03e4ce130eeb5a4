//! Semantic search handler
//!
//! Author: hephaex@gmail.com

use super::{n_results, require_non_empty};
use crate::error::AppError;
use crate::middleware::ActiveSession;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use vecadmin_core::{Metadata, SearchRow};

/// Search request
#[derive(Debug, Deserialize, ToSchema)]
pub struct SearchRequest {
    /// Text to embed and search with
    #[schema(example = "how do I rotate the api key?")]
    pub query: String,

    /// Number of hits (1-100, default 5)
    #[schema(example = 5)]
    pub n_results: Option<usize>,

    /// Metadata equality filter passed through as `where`
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub filter: Option<Metadata>,
}

/// One hit, closest first
#[derive(Debug, Serialize, ToSchema)]
pub struct SearchHit {
    pub id: String,
    pub text: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<Metadata>,
    /// Lower is more similar
    pub distance: Option<f32>,
}

impl From<SearchRow> for SearchHit {
    fn from(row: SearchRow) -> Self {
        Self {
            id: row.id,
            text: row.text,
            metadata: row.metadata,
            distance: row.distance,
        }
    }
}

/// Search response
#[derive(Debug, Serialize, ToSchema)]
pub struct SearchResponse {
    pub query: String,
    pub collection: String,
    pub results: Vec<SearchHit>,
}

/// Search a collection by meaning
#[utoipa::path(
    post,
    path = "/api/v1/collections/{name}/search",
    tag = "search",
    params(
        ("name" = String, Path, description = "Collection name"),
        ("x-session-id" = String, Header, description = "Session id")
    ),
    request_body = SearchRequest,
    responses(
        (status = 200, description = "Search results", body = SearchResponse),
        (status = 400, description = "Invalid request", body = crate::error::ApiError),
        (status = 404, description = "Unknown collection", body = crate::error::ApiError),
        (status = 502, description = "Vector store or embedding error", body = crate::error::ApiError)
    )
)]
pub async fn search(
    State(state): State<Arc<AppState>>,
    Extension(active): Extension<ActiveSession>,
    Path(name): Path<String>,
    Json(request): Json<SearchRequest>,
) -> Result<impl IntoResponse, AppError> {
    let query = require_non_empty("query", &request.query)?.to_string();
    let limit = n_results(request.n_results)?;
    let embedder = state.embedder()?;

    let mut session = active.session.lock().await;
    let embedding = embedder.embed(&query).await?;
    let result = session
        .client
        .query_collection(&name, &[embedding], limit, request.filter.as_ref())
        .await?;

    tracing::debug!(
        session = %session.id,
        collection = %name,
        hits = result.ids.first().map_or(0, Vec::len),
        "Search completed"
    );

    Ok(Json(SearchResponse {
        query,
        collection: name,
        results: result.rows(0).into_iter().map(SearchHit::from).collect(),
    }))
}
