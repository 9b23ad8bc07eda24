//! Owner-scoped session store.
//!
//! `SessionStore` sits between the chat service and a [`SessionRepository`].
//! It parses client-supplied identifiers, applies mutations to the in-memory
//! session first and then persists exactly what changed, and maps storage
//! failures into [`ChatError`].

use astroline_types::chat::{
    ChatMessage, ChatRole, ChatSession, ContextMap, MessageMetadata, OwnerId, SessionSummary,
};
use astroline_types::error::ChatError;
use uuid::Uuid;

use super::repository::SessionRepository;

/// Session persistence with owner scoping and error mapping.
pub struct SessionStore<R: SessionRepository> {
    repo: R,
}

impl<R: SessionRepository> SessionStore<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    /// Parse a client-supplied session ID. Malformed IDs are reported as
    /// `NotFound` so that callers cannot distinguish them from missing ones.
    pub fn resolve_id(raw: &str) -> Result<Uuid, ChatError> {
        Uuid::parse_str(raw.trim()).map_err(|_| ChatError::NotFound)
    }

    /// Create and persist a new active session.
    pub async fn create(
        &self,
        owner: OwnerId,
        title: Option<String>,
        context: ContextMap,
    ) -> Result<ChatSession, ChatError> {
        let session = ChatSession::new(owner, title, context);
        self.repo.create_session(&session).await?;
        Ok(session)
    }

    /// Fetch a session owned by `owner`. Absent or foreign sessions are
    /// `NotFound`.
    pub async fn get(&self, id: &Uuid, owner: &OwnerId) -> Result<ChatSession, ChatError> {
        self.repo
            .get_session(id, owner)
            .await?
            .ok_or(ChatError::NotFound)
    }

    pub async fn list(
        &self,
        owner: &OwnerId,
        active_only: bool,
    ) -> Result<Vec<SessionSummary>, ChatError> {
        Ok(self.repo.list_sessions(owner, active_only).await?)
    }

    /// The owner's most recently updated session, if any.
    pub async fn latest(&self, owner: &OwnerId) -> Result<Option<ChatSession>, ChatError> {
        Ok(self.repo.latest_session(owner).await?)
    }

    /// Append a message to `session` and persist it along with the updated
    /// title and timestamp.
    pub async fn append_message(
        &self,
        session: &mut ChatSession,
        role: ChatRole,
        content: String,
        metadata: MessageMetadata,
    ) -> Result<ChatMessage, ChatError> {
        let message = session.append(role, content, metadata).clone();
        self.repo.append_message(session, &message).await?;
        Ok(message)
    }

    /// Change the active flag. Returns `false` without touching storage
    /// when the session is already in the requested state.
    pub async fn set_active(&self, session: &mut ChatSession, active: bool) -> Result<bool, ChatError> {
        if !session.set_active(active) {
            return Ok(false);
        }
        self.repo.update_status(session).await?;
        Ok(true)
    }

    pub async fn delete(&self, session: &ChatSession) -> Result<(), ChatError> {
        Ok(self.repo.delete_session(&session.id, &session.owner_id).await?)
    }

    /// Remove every session belonging to `owner`.
    pub async fn purge(&self, owner: &OwnerId) -> Result<u64, ChatError> {
        Ok(self.repo.delete_owner_sessions(owner).await?)
    }
}
