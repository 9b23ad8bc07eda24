//! SessionRepository trait definition.
//!
//! Persistence port for chat sessions and their embedded message logs.
//! Every read and write is scoped by owner: a session belonging to another
//! owner behaves exactly like a missing one.

use astroline_types::chat::{ChatMessage, ChatSession, OwnerId, SessionSummary};
use astroline_types::error::RepositoryError;
use uuid::Uuid;

/// Repository trait for chat session persistence.
///
/// Implementations live in astroline-infra (e.g., `SqliteSessionRepository`).
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait SessionRepository: Send + Sync {
    /// Persist a freshly created session (empty message log).
    fn create_session(
        &self,
        session: &ChatSession,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Load a session with its full message log, if it exists and is owned by `owner`.
    fn get_session(
        &self,
        session_id: &Uuid,
        owner: &OwnerId,
    ) -> impl std::future::Future<Output = Result<Option<ChatSession>, RepositoryError>> + Send;

    /// List an owner's sessions, most recently updated first.
    fn list_sessions(
        &self,
        owner: &OwnerId,
        active_only: bool,
    ) -> impl std::future::Future<Output = Result<Vec<SessionSummary>, RepositoryError>> + Send;

    /// The owner's most recently updated session, in any state.
    fn latest_session(
        &self,
        owner: &OwnerId,
    ) -> impl std::future::Future<Output = Result<Option<ChatSession>, RepositoryError>> + Send;

    /// Persist `message`, which must be the last entry of `session`'s log,
    /// together with the session's current title and `updated_at`.
    ///
    /// Returns `NotFound` (and writes nothing) if the session row is gone.
    fn append_message(
        &self,
        session: &ChatSession,
        message: &ChatMessage,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Persist the session's status and `updated_at`.
    fn update_status(
        &self,
        session: &ChatSession,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Delete a session and its messages. `NotFound` if nothing was deleted.
    fn delete_session(
        &self,
        session_id: &Uuid,
        owner: &OwnerId,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Delete every session owned by `owner`. Returns the number removed.
    fn delete_owner_sessions(
        &self,
        owner: &OwnerId,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;
}
