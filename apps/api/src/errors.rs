use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::extraction::ExtractError;
use crate::history::StoreError;
use crate::llm_client::LlmError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
/// The `Display` text doubles as the user-facing banner message.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0} library not fully loaded.")]
    LibraryNotLoaded(String),

    #[error("Unsupported file type. Please use PDF, DOCX, or TXT.")]
    UnsupportedFormat,

    #[error("File appears empty or unreadable (scanned PDFs/Images are not supported).")]
    EmptyOrUnreadable,

    #[error("Failed to read file: {0}")]
    Unreadable(String),

    #[error("File is too large ({size} bytes, limit {limit}).")]
    PayloadTooLarge { size: usize, limit: usize },

    #[error("Failed to classify: API Error: {status}")]
    ApiError { status: u16 },

    #[error("Failed to classify: Empty response from AI.")]
    EmptyResponse,

    #[error("Failed to classify: {0}")]
    JsonParseFailure(String),

    #[error("Failed to classify: {0}")]
    Upstream(String),

    #[error("Another operation is still in progress.")]
    Busy,

    #[error("History storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<ExtractError> for AppError {
    fn from(err: ExtractError) -> Self {
        match err {
            ExtractError::LibraryNotLoaded(name) => AppError::LibraryNotLoaded(name.to_string()),
            ExtractError::UnsupportedFormat => AppError::UnsupportedFormat,
            ExtractError::EmptyOrUnreadable => AppError::EmptyOrUnreadable,
            ExtractError::TooLarge { size, limit } => AppError::PayloadTooLarge { size, limit },
            ExtractError::Malformed(msg) => AppError::Unreadable(msg),
        }
    }
}

impl From<LlmError> for AppError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Api { status, .. } => AppError::ApiError { status },
            LlmError::EmptyResponse => AppError::EmptyResponse,
            LlmError::Parse(e) => AppError::JsonParseFailure(e.to_string()),
            LlmError::Http(e) => AppError::Upstream(e.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        let (status, code) = match &self {
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            AppError::LibraryNotLoaded(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "LIBRARY_NOT_LOADED")
            }
            AppError::UnsupportedFormat => {
                (StatusCode::UNSUPPORTED_MEDIA_TYPE, "UNSUPPORTED_FORMAT")
            }
            AppError::EmptyOrUnreadable => {
                (StatusCode::UNPROCESSABLE_ENTITY, "EMPTY_OR_UNREADABLE")
            }
            AppError::Unreadable(_) => (StatusCode::UNPROCESSABLE_ENTITY, "UNREADABLE_DOCUMENT"),
            AppError::PayloadTooLarge { .. } => (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE"),
            AppError::ApiError { status } => {
                tracing::error!("AI endpoint returned status {status}");
                (StatusCode::BAD_GATEWAY, "API_ERROR")
            }
            AppError::EmptyResponse => {
                tracing::error!("AI endpoint returned no text");
                (StatusCode::BAD_GATEWAY, "EMPTY_RESPONSE")
            }
            AppError::JsonParseFailure(msg) => {
                tracing::error!("AI response was not a valid report: {msg}");
                (StatusCode::BAD_GATEWAY, "JSON_PARSE_FAILURE")
            }
            AppError::Upstream(msg) => {
                tracing::error!("AI endpoint unreachable: {msg}");
                (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR")
            }
            AppError::Busy => (StatusCode::CONFLICT, "BUSY"),
            AppError::Store(e) => {
                tracing::error!("History store error: {e}");
                (StatusCode::INTERNAL_SERVER_ERROR, "STORE_ERROR")
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
