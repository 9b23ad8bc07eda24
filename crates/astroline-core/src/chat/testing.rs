//! In-memory SessionRepository for unit tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use astroline_types::chat::{ChatMessage, ChatSession, OwnerId, SessionSummary};
use astroline_types::error::RepositoryError;
use uuid::Uuid;

use super::repository::SessionRepository;

/// Stores whole session records in a shared map. Clones share state.
#[derive(Clone, Default)]
pub(crate) struct InMemorySessionRepository {
    sessions: Arc<Mutex<HashMap<Uuid, ChatSession>>>,
    fail_writes: Arc<Mutex<bool>>,
}

impl InMemorySessionRepository {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail with a connection error.
    pub(crate) fn fail_writes(&self) {
        *self.fail_writes.lock().unwrap() = true;
    }

    pub(crate) fn stored(&self, id: &Uuid) -> Option<ChatSession> {
        self.sessions.lock().unwrap().get(id).cloned()
    }

    fn check_writable(&self) -> Result<(), RepositoryError> {
        if *self.fail_writes.lock().unwrap() {
            Err(RepositoryError::Connection)
        } else {
            Ok(())
        }
    }

    fn owned(&self, id: &Uuid, owner: &OwnerId) -> Option<ChatSession> {
        self.sessions
            .lock()
            .unwrap()
            .get(id)
            .filter(|s| &s.owner_id == owner)
            .cloned()
    }

    fn replace(&self, session: &ChatSession) -> Result<(), RepositoryError> {
        self.check_writable()?;
        let mut sessions = self.sessions.lock().unwrap();
        match sessions.get_mut(&session.id) {
            Some(stored) if stored.owner_id == session.owner_id => {
                *stored = session.clone();
                Ok(())
            }
            _ => Err(RepositoryError::NotFound),
        }
    }
}

impl SessionRepository for InMemorySessionRepository {
    async fn create_session(&self, session: &ChatSession) -> Result<(), RepositoryError> {
        self.check_writable()?;
        self.sessions
            .lock()
            .unwrap()
            .insert(session.id, session.clone());
        Ok(())
    }

    async fn get_session(
        &self,
        session_id: &Uuid,
        owner: &OwnerId,
    ) -> Result<Option<ChatSession>, RepositoryError> {
        Ok(self.owned(session_id, owner))
    }

    async fn list_sessions(
        &self,
        owner: &OwnerId,
        active_only: bool,
    ) -> Result<Vec<SessionSummary>, RepositoryError> {
        let mut sessions: Vec<ChatSession> = self
            .sessions
            .lock()
            .unwrap()
            .values()
            .filter(|s| &s.owner_id == owner && (!active_only || s.is_active()))
            .cloned()
            .collect();
        sessions.sort_by(|a, b| {
            b.updated_at()
                .cmp(&a.updated_at())
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(sessions.iter().map(ChatSession::summary).collect())
    }

    async fn latest_session(&self, owner: &OwnerId) -> Result<Option<ChatSession>, RepositoryError> {
        let latest = self.list_sessions(owner, false).await?.into_iter().next();
        Ok(latest.and_then(|summary| self.owned(&summary.id, owner)))
    }

    async fn append_message(
        &self,
        session: &ChatSession,
        _message: &ChatMessage,
    ) -> Result<(), RepositoryError> {
        self.replace(session)
    }

    async fn update_status(&self, session: &ChatSession) -> Result<(), RepositoryError> {
        self.replace(session)
    }

    async fn delete_session(&self, session_id: &Uuid, owner: &OwnerId) -> Result<(), RepositoryError> {
        self.check_writable()?;
        let mut sessions = self.sessions.lock().unwrap();
        match sessions.get(session_id) {
            Some(s) if &s.owner_id == owner => {
                sessions.remove(session_id);
                Ok(())
            }
            _ => Err(RepositoryError::NotFound),
        }
    }

    async fn delete_owner_sessions(&self, owner: &OwnerId) -> Result<u64, RepositoryError> {
        self.check_writable()?;
        let mut sessions = self.sessions.lock().unwrap();
        let before = sessions.len();
        sessions.retain(|_, s| &s.owner_id != owner);
        Ok((before - sessions.len()) as u64)
    }
}
