//! Application error type mapping to HTTP status codes.
//!
//! Every error body has the shape `{"detail": <message>, "code": <CODE>}`.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::json;

use astroline_types::error::ChatError;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Chat engine errors.
    Chat(ChatError),
    /// Missing or invalid bearer token.
    Unauthorized(String),
    /// Malformed request body or query.
    Validation(String),
}

impl From<ChatError> for AppError {
    fn from(e: ChatError) -> Self {
        AppError::Chat(e)
    }
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Chat(ChatError::NotFound) => (
                StatusCode::NOT_FOUND,
                "SESSION_NOT_FOUND",
                "Chat session not found".to_string(),
            ),
            AppError::Chat(ChatError::InvalidState) => (
                StatusCode::BAD_REQUEST,
                "SESSION_NOT_ACTIVE",
                "Chat session is no longer active".to_string(),
            ),
            AppError::Chat(ChatError::Validation(msg)) | AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            AppError::Chat(ChatError::Persistence(_)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "PERSISTENCE_ERROR",
                "Chat storage is unavailable".to_string(),
            ),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Chat(ChatError::Persistence(detail)) = &self {
            tracing::error!(error = %detail, "chat persistence failure");
        }

        let (status, code, detail) = self.parts();
        let body = axum::Json(json!({ "detail": detail, "code": code }));

        if status == StatusCode::UNAUTHORIZED {
            return (status, [(header::WWW_AUTHENTICATE, "Bearer")], body).into_response();
        }
        (status, body).into_response()
    }
}
