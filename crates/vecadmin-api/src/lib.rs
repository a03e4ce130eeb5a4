//! VecAdmin API - JSON server for administering a vector store
//!
//! Each operator opens a session with `POST /api/v1/connect` and passes the
//! returned id in the `X-Session-Id` header. A session owns one
//! vector-store client; text operations go through the shared embedding
//! client.
//!
//! Author: hephaex@gmail.com

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

use crate::handlers::{collections, databases, documents, health, query, session};
use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    routing::get,
    Json, Router,
};
use state::AppState;
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;

/// OpenAPI document
#[derive(OpenApi)]
#[openapi(
    info(
        title = "VecAdmin API",
        description = "Administration API for tenant/database scoped vector stores"
    ),
    paths(
        health::health_check,
        health::readiness_check,
        session::connect,
        session::disconnect,
        session::get_session,
        session::switch_database,
        databases::list_databases,
        databases::create_database,
        databases::delete_database,
        collections::list_collections,
        collections::create_collection,
        collections::get_collection,
        collections::delete_collection,
        documents::list_documents,
        documents::add_documents,
        documents::update_document,
        documents::delete_document,
        query::search,
    ),
    components(schemas(
        error::ApiError,
        health::HealthResponse,
        health::ReadinessResponse,
        session::ConnectRequest,
        session::SwitchDatabaseRequest,
        session::SessionResponse,
        databases::DatabaseResponse,
        databases::DatabaseListResponse,
        databases::CreateDatabaseRequest,
        collections::CollectionResponse,
        collections::CollectionListResponse,
        collections::CollectionDetailResponse,
        collections::CreateCollectionRequest,
        documents::DocumentResponse,
        documents::DocumentListResponse,
        documents::NewDocument,
        documents::AddDocumentsRequest,
        documents::AddDocumentsResponse,
        documents::UpdateDocumentRequest,
        query::SearchRequest,
        query::SearchHit,
        query::SearchResponse,
    )),
    tags(
        (name = "health", description = "Liveness and readiness"),
        (name = "session", description = "Connect to a vector store"),
        (name = "databases", description = "Tenant databases"),
        (name = "collections", description = "Collections of the session database"),
        (name = "documents", description = "Documents of a collection"),
        (name = "search", description = "Semantic search")
    )
)]
pub struct ApiDoc;

/// CORS layer for the configured origins; no origins means same-origin only
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static(middleware::SESSION_HEADER),
        ])
}

/// Build the full application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.server.cors_origins);

    Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .route(
            "/api-docs/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .nest("/api/v1", routes::api_routes(state.clone()))
        .layer(axum::middleware::from_fn(
            middleware::security_headers_middleware,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_routes() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/v1/connect"));
        assert!(doc
            .paths
            .paths
            .contains_key("/api/v1/collections/{name}/search"));
    }

    #[test]
    fn test_cors_skips_invalid_origins() {
        // Must not panic on garbage
        let _ = cors_layer(&["http://ok.test".to_string(), "bad\norigin".to_string()]);
    }
}
