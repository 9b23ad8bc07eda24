//! Chat session HTTP handlers.
//!
//! Endpoints (all under `/api/v1/chat`, all require a bearer token):
//! - GET    /                        - Messages of the most recent session
//! - POST   /sessions                - Create a session
//! - GET    /sessions                - List sessions (`?active_only=`)
//! - POST   /sessions/{id}/messages  - Send a message, returns the reply
//! - GET    /sessions/{id}/messages  - Full message log
//! - POST   /sessions/{id}/end       - End a session
//! - DELETE /sessions/{id}           - Delete a session and its messages

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use astroline_types::chat::{ChatMessage, ContextMap, MessageMetadata, SessionSummary};

use crate::http::error::AppError;
use crate::http::extractors::auth::CurrentUser;
use crate::http::extractors::query::SessionListQuery;
use crate::state::AppState;

/// Request body for creating a session.
#[derive(Debug, Default, Deserialize)]
pub struct CreateSessionRequest {
    pub title: Option<String>,
    #[serde(default)]
    pub context: Option<ContextMap>,
}

/// Request body for sending a message.
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
    #[serde(default)]
    pub metadata: Option<MessageMetadata>,
}

/// Confirmation body for end and delete.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub(crate) fn new(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            message: message.into(),
        })
    }
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| AppError::Validation(rejection.body_text()))
}

/// POST /api/v1/chat/sessions
pub async fn create_session(
    State(state): State<AppState>,
    CurrentUser(owner): CurrentUser,
    payload: Result<Json<CreateSessionRequest>, JsonRejection>,
) -> Result<Json<SessionSummary>, AppError> {
    let request = body(payload)?;
    let session = state
        .chat_service
        .create_session(&owner, request.title, request.context.unwrap_or_default())
        .await?;
    Ok(Json(session.summary()))
}

/// GET /api/v1/chat/sessions
pub async fn list_sessions(
    State(state): State<AppState>,
    CurrentUser(owner): CurrentUser,
    query: Result<Query<SessionListQuery>, QueryRejection>,
) -> Result<Json<Vec<SessionSummary>>, AppError> {
    let Query(query) = query.map_err(|rejection| AppError::Validation(rejection.body_text()))?;
    let sessions = state
        .chat_service
        .list_sessions(&owner, query.active_only)
        .await?;
    Ok(Json(sessions))
}

/// POST /api/v1/chat/sessions/{id}/messages
pub async fn send_message(
    State(state): State<AppState>,
    CurrentUser(owner): CurrentUser,
    Path(session_id): Path<String>,
    payload: Result<Json<SendMessageRequest>, JsonRejection>,
) -> Result<Json<ChatMessage>, AppError> {
    let request = body(payload)?;
    let reply = state
        .chat_service
        .send_message(
            &owner,
            &session_id,
            request.content,
            request.metadata.unwrap_or_default(),
        )
        .await?;
    Ok(Json(reply))
}

/// GET /api/v1/chat/sessions/{id}/messages
pub async fn get_messages(
    State(state): State<AppState>,
    CurrentUser(owner): CurrentUser,
    Path(session_id): Path<String>,
) -> Result<Json<Vec<ChatMessage>>, AppError> {
    let messages = state.chat_service.get_messages(&owner, &session_id).await?;
    Ok(Json(messages))
}

/// POST /api/v1/chat/sessions/{id}/end
pub async fn end_session(
    State(state): State<AppState>,
    CurrentUser(owner): CurrentUser,
    Path(session_id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    state.chat_service.end_session(&owner, &session_id).await?;
    Ok(MessageResponse::new("Chat session ended successfully"))
}

/// DELETE /api/v1/chat/sessions/{id}
pub async fn delete_session(
    State(state): State<AppState>,
    CurrentUser(owner): CurrentUser,
    Path(session_id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    state.chat_service.delete_session(&owner, &session_id).await?;
    Ok(MessageResponse::new("Chat session deleted successfully"))
}

/// GET /api/v1/chat
pub async fn history(
    State(state): State<AppState>,
    CurrentUser(owner): CurrentUser,
) -> Result<Json<Vec<ChatMessage>>, AppError> {
    let messages = state.chat_service.history(&owner).await?;
    Ok(Json(messages))
}
