//! Error types for crm-api
//!
//! Every handler error is translated at the boundary into the JSON envelope
//! `{ success: false, error, message? }` with the matching status code.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or invalid request field (400)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Referenced resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Unique-constraint conflict, e.g. duplicate email (409)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// Database error (500, unless a unique violation)
    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        // The storage constraint is the source of truth for uniqueness; the
        // application-level pre-checks are only a fast path.
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.is_unique_violation() {
                return ApiError::Conflict(
                    "A record with this unique field already exists".to_string(),
                );
            }
        }
        ApiError::Database(err)
    }
}

impl From<crm_common::Error> for ApiError {
    fn from(err: crm_common::Error) -> Self {
        match err {
            crm_common::Error::NotFound(msg) => ApiError::NotFound(msg),
            crm_common::Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            crm_common::Error::Conflict(msg) => ApiError::Conflict(msg),
            crm_common::Error::Database(e) => ApiError::from(e),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg, None),
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
                Some(msg),
            ),
            ApiError::Database(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Database error".to_string(),
                Some(err.to_string()),
            ),
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("request failed: {} ({:?})", error, message);
        } else {
            tracing::debug!("request rejected: {} {}", status, error);
        }

        let body = match message {
            Some(message) => Json(json!({
                "success": false,
                "error": error,
                "message": message,
            })),
            None => Json(json!({
                "success": false,
                "error": error,
            })),
        };

        (status, body).into_response()
    }
}
