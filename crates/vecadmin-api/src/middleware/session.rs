//! Session middleware
//!
//! Resolves the `X-Session-Id` header to a live session and hands it to the
//! handler through request extensions.
//!
//! Author: hephaex@gmail.com

use crate::error::AppError;
use crate::state::{AppState, SessionHandle};
use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use uuid::Uuid;

/// Header carrying the session id returned by `POST /api/v1/connect`
pub const SESSION_HEADER: &str = "x-session-id";

/// Session attached to an authenticated request
///
/// Extract in handlers with `Extension<ActiveSession>`.
#[derive(Clone)]
pub struct ActiveSession {
    pub id: Uuid,
    pub session: SessionHandle,
}

/// Reject requests without a known session
pub async fn session_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    state.increment_requests();

    let header = request
        .headers()
        .get(SESSION_HEADER)
        .and_then(|h| h.to_str().ok());

    let id = match header.map(Uuid::parse_str) {
        Some(Ok(id)) => id,
        Some(Err(_)) => {
            return AppError::unauthorized("Malformed session id").into_response();
        }
        None => {
            return AppError::unauthorized(format!(
                "Missing {SESSION_HEADER} header; connect first"
            ))
            .into_response();
        }
    };

    let Some(session) = state.session(&id).await else {
        tracing::debug!(session = %id, "Unknown session");
        return AppError::unauthorized("Unknown or expired session").into_response();
    };

    request
        .extensions_mut()
        .insert(ActiveSession { id, session });
    next.run(request).await
}
