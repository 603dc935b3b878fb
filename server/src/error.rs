//! Unified error handling for the server.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tally_engine::ErrorKind;

/// Application error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{0}")]
    Engine(#[from] tally_engine::Error),

    #[error("Invalid request body: {0}")]
    Body(#[from] JsonRejection),
}

/// Error response body.
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Engine(e) => match e.kind() {
                ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::Forbidden => StatusCode::FORBIDDEN,
                ErrorKind::TransactionFailed => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::Body(JsonRejection::JsonDataError(_) | JsonRejection::JsonSyntaxError(_)) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Body(rejection) => rejection.status(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (error_message, details) = match &self {
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                ("Database error".to_string(), None)
            }
            AppError::Engine(e) if e.kind() == ErrorKind::TransactionFailed => {
                tracing::error!("Transaction failed: {}", e);
                (
                    "Transaction failed".to_string(),
                    Some("no changes were applied".to_string()),
                )
            }
            AppError::Engine(e) => {
                tracing::warn!("Engine error: {}", e);
                (e.to_string(), None)
            }
            AppError::Body(rejection) => {
                tracing::debug!("Rejected request body: {}", rejection);
                ("Invalid request body".to_string(), Some(rejection.body_text()))
            }
        };

        let body = Json(ErrorResponse {
            error: error_message,
            details,
        });

        (status, body).into_response()
    }
}

/// Result type alias for handlers.
pub type Result<T> = std::result::Result<T, AppError>;
