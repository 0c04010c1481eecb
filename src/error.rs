//! Error taxonomy shared by the stores, the review pipeline and the HTTP layer.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::discovery::DiscoveryError;

/// Errors surfaced by core operations.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A referenced report or candidate does not exist.
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: i32 },

    /// A required field is missing. Nothing was written.
    #[error("{0}")]
    Validation(String),

    /// The requested review transition is not allowed from the current state.
    #[error("{0}")]
    Conflict(String),

    /// The discovery provider could not be queried.
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    /// Any persistence failure other than the deduplication conflict.
    #[error("storage error: {0}")]
    Storage(#[from] diesel::result::Error),

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn report_not_found(id: i32) -> Self {
        AppError::NotFound { kind: "report", id }
    }

    pub fn candidate_not_found(id: i32) -> Self {
        AppError::NotFound {
            kind: "candidate",
            id,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Discovery(DiscoveryError::NotConfigured) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Discovery(_) => StatusCode::BAD_GATEWAY,
            AppError::Storage(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(format!("{:#}", err))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            // Storage details stay in the log.
            AppError::Storage(e) => {
                tracing::error!("Storage failure: {}", e);
                "storage error".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "internal error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

/// Convenience alias for core results.
pub type AppResult<T> = Result<T, AppError>;
