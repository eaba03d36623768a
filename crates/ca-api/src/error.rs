//! エラー型定義 (ca-api)

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use ca_core::ChatMessage;

/// Reply sent when no LLM credential is configured
pub const UNAVAILABLE_MESSAGE: &str = "I'm sorry, but the AI assistant is currently unavailable. Please try again later or contact support for assistance.";

/// Reply sent when the upstream request fails
pub const APOLOGY_MESSAGE: &str =
    "I'm sorry, but I encountered an error processing your request. Please try again later.";

/// ca-api のエラー型
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Event not found: {0}")]
    EventNotFound(String),

    #[error("Request failed: {0}")]
    RequestFailure(String),
}

impl From<ca_core::Error> for ApiError {
    fn from(e: ca_core::Error) -> Self {
        ApiError::RequestFailure(e.to_string())
    }
}

/// Generic API error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::InvalidRequest(_) => (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: self.to_string(),
                }),
            )
                .into_response(),
            ApiError::EventNotFound(_) => (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: self.to_string(),
                }),
            )
                .into_response(),
            ApiError::RequestFailure(detail) => {
                error!("Chat request failed: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ChatMessage::assistant(APOLOGY_MESSAGE)),
                )
                    .into_response()
            }
        }
    }
}

/// Result 型エイリアス
pub type Result<T> = std::result::Result<T, ApiError>;
