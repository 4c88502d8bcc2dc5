use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Unauthorized(String),

    /// An upstream provider call failed; the raw provider payload is
    /// attached to the response body under `details`.
    #[error("{message}")]
    Provider {
        message: String,
        details: serde_json::Value,
    },

    #[error("Too many transactions")]
    RecordLimitExceeded { limit: usize },
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Provider { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::RecordLimitExceeded { .. } => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            AppError::Provider { message, details } => Json(json!({
                "error": message,
                "details": details,
            })),
            AppError::RecordLimitExceeded { limit } => Json(json!({
                "error": "Too many transactions",
                "message": format!("Maximum {} transactions allowed per request", limit),
            })),
            other => Json(json!({
                "error": other.to_string(),
            })),
        };

        (status, body).into_response()
    }
}
