//! API route definitions
//!
//! Author: hephaex@gmail.com

use crate::handlers::{collections, databases, documents, query, session};
use crate::middleware::session_middleware;
use crate::state::AppState;
use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;

/// Create API v1 routes
pub fn api_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    // Opening a session is the only call that needs none
    let public_routes = Router::new().route("/connect", post(session::connect));

    let session_routes = Router::new()
        .route("/disconnect", post(session::disconnect))
        .route("/session", get(session::get_session))
        .route("/session/database", put(session::switch_database))
        // Database endpoints
        .route(
            "/databases",
            get(databases::list_databases).post(databases::create_database),
        )
        .route("/databases/:name", delete(databases::delete_database))
        // Collection endpoints
        .route(
            "/collections",
            get(collections::list_collections).post(collections::create_collection),
        )
        .route(
            "/collections/:name",
            get(collections::get_collection).delete(collections::delete_collection),
        )
        // Document endpoints
        .route(
            "/collections/:name/documents",
            get(documents::list_documents).post(documents::add_documents),
        )
        .route(
            "/collections/:name/documents/:id",
            put(documents::update_document).delete(documents::delete_document),
        )
        // Search
        .route("/collections/:name/search", post(query::search))
        .route_layer(middleware::from_fn_with_state(state, session_middleware));

    Router::new().merge(public_routes).merge(session_routes)
}
