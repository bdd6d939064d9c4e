//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//!
//! Every error response has the same JSON body: `{"error": "<message>"}`.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::OrderError;

/// Application-level error type for the order API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Storage failed while listing orders.
    ///
    /// Answered as a 400 with a fixed message, but still captured to Sentry.
    #[error("{message}: {source}")]
    ListFailed {
        message: &'static str,
        #[source]
        source: RepositoryError,
    },
}

impl AppError {
    /// Map a failure from listing orders.
    #[must_use]
    pub fn from_list_error(err: OrderError) -> Self {
        match err {
            OrderError::Storage(source) => Self::ListFailed {
                message: "Failed to get orders",
                source,
            },
            other => other.into(),
        }
    }
}

/// JSON error envelope.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture storage failures to Sentry
        if matches!(self, Self::Database(_) | Self::ListFailed { .. }) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = match &self {
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) | Self::ListFailed { .. } => StatusCode::BAD_REQUEST,
        };

        // Don't expose internal error details to clients
        let message = match self {
            Self::Database(_) => "Internal server error".to_string(),
            Self::NotFound(_) => "Not found".to_string(),
            Self::BadRequest(msg) => msg,
            Self::ListFailed { message, .. } => message.to_string(),
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::Validation(msg) => Self::BadRequest(msg),
            OrderError::NotFound(id) => {
                tracing::info!(order_id = %id, "Order not found");
                Self::BadRequest("Can not find order".to_string())
            }
            OrderError::Storage(e) if e.is_client_fault() => {
                tracing::warn!(error = %e, "Order rejected by storage");
                Self::BadRequest("Failed to save order".to_string())
            }
            OrderError::Storage(e) => Self::Database(e),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::info!(error = %rejection.body_text(), "Rejected order payload");
        Self::BadRequest("Failed to parse json data".to_string())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        tracing::info!(error = %rejection.body_text(), "Rejected path parameter");
        Self::BadRequest("Failed to retrieve id param".to_string())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        tracing::info!(error = %rejection.body_text(), "Rejected query string");
        Self::BadRequest("Invalid query parameters".to_string())
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
