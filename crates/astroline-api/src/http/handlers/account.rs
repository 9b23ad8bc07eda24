//! Account-level handlers.

use axum::extract::State;
use axum::Json;

use crate::http::error::AppError;
use crate::http::extractors::auth::CurrentUser;
use crate::http::handlers::chat::MessageResponse;
use crate::state::AppState;

/// DELETE /api/v1/account
///
/// Removes every chat session (and message) owned by the caller.
pub async fn delete_account(
    State(state): State<AppState>,
    CurrentUser(owner): CurrentUser,
) -> Result<Json<MessageResponse>, AppError> {
    state.chat_service.purge_owner(&owner).await?;
    Ok(MessageResponse::new("Account chat data deleted successfully"))
}
