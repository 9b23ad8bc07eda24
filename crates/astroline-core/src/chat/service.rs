//! Chat service orchestrating session lifecycle and chat turns.
//!
//! `ChatService` coordinates the session store, the context assembler, and
//! the response generator. A chat turn is:
//!
//! 1. validate the utterance and lock the session
//! 2. load it (owner-scoped) and check that it is active
//! 3. durably append the user message
//! 4. assemble the prompt from the messages that preceded it
//! 5. generate a reply (real or fallback)
//! 6. append the assistant message
//!
//! The session lock is held across steps 2-6, so the two messages of a turn
//! are always adjacent in the log.

use astroline_types::chat::{
    validate_context, ChatMessage, ChatRole, ChatSession, ContextMap, MessageMetadata, OwnerId,
    SessionSummary,
};
use astroline_types::error::ChatError;
use serde_json::Value;
use tracing::{debug, info};

use crate::chat::context::ContextAssembler;
use crate::chat::locks::SessionLocks;
use crate::chat::repository::SessionRepository;
use crate::chat::store::SessionStore;
use crate::llm::generator::ResponseGenerator;

/// Orchestrates chat sessions for authenticated owners.
///
/// Generic over `SessionRepository` to maintain clean architecture
/// (astroline-core never depends on astroline-infra). Holds no session state
/// between calls apart from the lock registry.
pub struct ChatService<R: SessionRepository> {
    store: SessionStore<R>,
    assembler: ContextAssembler,
    generator: ResponseGenerator,
    locks: SessionLocks,
}

impl<R: SessionRepository> ChatService<R> {
    pub fn new(repo: R, assembler: ContextAssembler, generator: ResponseGenerator) -> Self {
        Self {
            store: SessionStore::new(repo),
            assembler,
            generator,
            locks: SessionLocks::new(),
        }
    }

    pub fn store(&self) -> &SessionStore<R> {
        &self.store
    }

    pub fn generator(&self) -> &ResponseGenerator {
        &self.generator
    }

    pub fn locks(&self) -> &SessionLocks {
        &self.locks
    }

    // --- Session lifecycle ---

    /// Create a new active session for `owner`.
    pub async fn create_session(
        &self,
        owner: &OwnerId,
        title: Option<String>,
        context: ContextMap,
    ) -> Result<ChatSession, ChatError> {
        validate_context(&context).map_err(ChatError::Validation)?;

        let session = self.store.create(owner.clone(), title, context).await?;
        info!(session_id = %session.id, owner = %owner, "chat session created");
        Ok(session)
    }

    /// List the owner's sessions, most recently updated first.
    pub async fn list_sessions(
        &self,
        owner: &OwnerId,
        active_only: bool,
    ) -> Result<Vec<SessionSummary>, ChatError> {
        self.store.list(owner, active_only).await
    }

    pub async fn get_session(&self, owner: &OwnerId, session_id: &str) -> Result<ChatSession, ChatError> {
        let id = SessionStore::<R>::resolve_id(session_id)?;
        self.store.get(&id, owner).await
    }

    /// All messages of a session in conversation order.
    pub async fn get_messages(
        &self,
        owner: &OwnerId,
        session_id: &str,
    ) -> Result<Vec<ChatMessage>, ChatError> {
        let session = self.get_session(owner, session_id).await?;
        Ok(session.messages().to_vec())
    }

    /// Mark a session as ended. Ending an ended session is a no-op.
    pub async fn end_session(&self, owner: &OwnerId, session_id: &str) -> Result<(), ChatError> {
        let id = SessionStore::<R>::resolve_id(session_id)?;
        let _guard = self.locks.acquire(id).await;

        let mut session = self.store.get(&id, owner).await?;
        if self.store.set_active(&mut session, false).await? {
            info!(session_id = %id, "chat session ended");
        }
        Ok(())
    }

    /// Permanently delete a session and its messages.
    pub async fn delete_session(&self, owner: &OwnerId, session_id: &str) -> Result<(), ChatError> {
        let id = SessionStore::<R>::resolve_id(session_id)?;
        let _guard = self.locks.acquire(id).await;

        let session = self.store.get(&id, owner).await?;
        self.store.delete(&session).await?;
        info!(session_id = %id, "chat session deleted");
        Ok(())
    }

    /// Messages of the owner's most recently updated session, or nothing if
    /// the owner has no sessions. Never creates a session.
    pub async fn history(&self, owner: &OwnerId) -> Result<Vec<ChatMessage>, ChatError> {
        Ok(self
            .store
            .latest(owner)
            .await?
            .map(|s| s.messages().to_vec())
            .unwrap_or_default())
    }

    /// Remove every session of `owner`. Returns the number removed.
    pub async fn purge_owner(&self, owner: &OwnerId) -> Result<u64, ChatError> {
        let removed = self.store.purge(owner).await?;
        info!(owner = %owner, removed, "owner chat data purged");
        Ok(removed)
    }

    // --- Chat turns ---

    /// Run one chat turn and return the stored assistant message.
    ///
    /// Generation failures never surface here: the reply is then the
    /// fallback text with `degraded: true` in its metadata.
    pub async fn send_message(
        &self,
        owner: &OwnerId,
        session_id: &str,
        content: String,
        metadata: MessageMetadata,
    ) -> Result<ChatMessage, ChatError> {
        if content.trim().is_empty() {
            return Err(ChatError::Validation("message content must not be empty".into()));
        }

        let id = SessionStore::<R>::resolve_id(session_id)?;
        let _guard = self.locks.acquire(id).await;

        let mut session = self.store.get(&id, owner).await?;
        if !session.is_active() {
            return Err(ChatError::InvalidState);
        }

        let prior_len = session.message_count();
        self.store
            .append_message(&mut session, ChatRole::User, content.clone(), metadata)
            .await?;

        let prompt = self
            .assembler
            .assemble(&session.context, &session.messages()[..prior_len], &content);
        debug!(session_id = %id, prompt_messages = prompt.len(), "prompt assembled");

        let generation = self.generator.generate(prompt).await;

        let mut reply_metadata = MessageMetadata::new();
        reply_metadata.insert("model".into(), Value::String(generation.model));
        reply_metadata.insert("response_ms".into(), Value::from(generation.response_ms));
        reply_metadata.insert("degraded".into(), Value::Bool(generation.degraded));

        let reply = self
            .store
            .append_message(&mut session, ChatRole::Assistant, generation.content, reply_metadata)
            .await?;

        info!(
            session_id = %id,
            messages = session.message_count(),
            degraded = generation.degraded,
            "chat turn completed"
        );
        Ok(reply)
    }
}
