//! API error handling
//!
//! Every failure, whatever its origin, reaches the caller as the same
//! JSON body: `{code, message, details?}`.
//!
//! Author: hephaex@gmail.com

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use vecadmin_core::VecAdminError;

/// API error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// Error code
    pub code: String,
    /// Human-readable message
    pub message: String,
    /// Additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Application error type
#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    BadRequest(String),
    Unauthorized(String),
    /// The vector store or embedding service failed us
    Upstream {
        code: &'static str,
        message: String,
        details: Option<String>,
    },
    Internal(String),
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ApiError::new("NOT_FOUND", msg)),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, ApiError::new("BAD_REQUEST", msg))
            }
            AppError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, ApiError::new("UNAUTHORIZED", msg))
            }
            AppError::Upstream {
                code,
                message,
                details,
            } => {
                let error = ApiError::new(code, message);
                let error = match details {
                    Some(details) => error.with_details(details),
                    None => error,
                };
                (StatusCode::BAD_GATEWAY, error)
            }
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::new("INTERNAL_ERROR", "Internal server error").with_details(msg),
            ),
        };

        (status, Json(error)).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<VecAdminError> for AppError {
    fn from(err: VecAdminError) -> Self {
        let message = err.to_string();

        match err {
            VecAdminError::NotFound { .. } => AppError::NotFound(message),
            VecAdminError::ValidationError(msg) => AppError::BadRequest(msg),
            VecAdminError::Remote { status, url, .. } => AppError::Upstream {
                code: "REMOTE_ERROR",
                message,
                details: Some(format!("{url} answered {status}")),
            },
            VecAdminError::Decode { url, .. } => AppError::Upstream {
                code: "DECODE_ERROR",
                message,
                details: Some(url),
            },
            VecAdminError::Transport { url, .. } => AppError::Upstream {
                code: "UPSTREAM_UNAVAILABLE",
                message,
                details: Some(url),
            },
            VecAdminError::ConfigError(_) => AppError::Internal(message),
        }
    }
}
