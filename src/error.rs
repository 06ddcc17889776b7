use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Body returned for any storage failure, kept apart from informational notifications
pub const STORAGE_FAILURE_MESSAGE: &str = "Watchlist storage is unavailable";

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("External API error: {0}")]
    ExternalApi(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// True for failures of the persistence engine
    pub fn is_storage_fault(&self) -> bool {
        matches!(self, AppError::Storage(_) | AppError::Migration(_))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Storage(ref e) => {
                tracing::error!(error = %e, "Watchlist storage fault");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    STORAGE_FAILURE_MESSAGE.to_string(),
                )
            }
            AppError::Migration(ref e) => {
                tracing::error!(error = %e, "Watchlist schema migration fault");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    STORAGE_FAILURE_MESSAGE.to_string(),
                )
            }
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
            AppError::ExternalApi(msg) => (StatusCode::BAD_GATEWAY, msg),
            AppError::HttpClient(_) => (StatusCode::BAD_GATEWAY, self.to_string()),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
