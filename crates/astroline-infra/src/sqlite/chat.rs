//! SQLite chat session repository implementation.
//!
//! Implements `SessionRepository` from `astroline-core` using sqlx with split
//! read/write pools. Sessions live in `chat_sessions`; each session's message
//! log lives in `chat_messages`, ordered by a per-session `seq` and removed
//! by `ON DELETE CASCADE`. Every statement is scoped by `owner_id`.

use astroline_core::chat::repository::SessionRepository;
use astroline_types::chat::{
    ChatMessage, ChatRole, ChatSession, ContextMap, MessageMetadata, OwnerId, SessionRecord,
    SessionStatus, SessionSummary, PLACEHOLDER_TITLE,
};
use astroline_types::error::RepositoryError;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `SessionRepository`.
pub struct SqliteSessionRepository {
    pool: DatabasePool,
}

impl SqliteSessionRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    async fn load_messages(&self, session_id: &str) -> Result<Vec<ChatMessage>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM chat_messages WHERE session_id = ? ORDER BY seq ASC")
            .bind(session_id)
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut messages = Vec::with_capacity(rows.len());
        for row in &rows {
            let msg_row =
                ChatMessageRow::from_row(row).map_err(|e| RepositoryError::Query(e.to_string()))?;
            messages.push(msg_row.into_message()?);
        }
        Ok(messages)
    }

    async fn load_session(
        &self,
        row: Option<sqlx::sqlite::SqliteRow>,
    ) -> Result<Option<ChatSession>, RepositoryError> {
        let Some(row) = row else {
            return Ok(None);
        };
        let session_row =
            ChatSessionRow::from_row(&row).map_err(|e| RepositoryError::Query(e.to_string()))?;
        let messages = self.load_messages(&session_row.id).await?;
        Ok(Some(session_row.into_session(messages)?))
    }
}

// ---------------------------------------------------------------------------
// Private Row types for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

struct ChatSessionRow {
    id: String,
    owner_id: String,
    title: Option<String>,
    context: String,
    status: String,
    created_at: String,
    updated_at: String,
}

impl ChatSessionRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            owner_id: row.try_get("owner_id")?,
            title: row.try_get("title")?,
            context: row.try_get("context")?,
            status: row.try_get("status")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_session(self, messages: Vec<ChatMessage>) -> Result<ChatSession, RepositoryError> {
        let context: ContextMap = serde_json::from_str(&self.context)
            .map_err(|e| RepositoryError::Query(format!("invalid session context: {e}")))?;

        Ok(ChatSession::restore(SessionRecord {
            id: parse_uuid(&self.id, "session id")?,
            owner_id: OwnerId(self.owner_id),
            title: self.title,
            context,
            status: parse_status(&self.status)?,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
            messages,
        }))
    }
}

/// Session row joined with its message count, for list views.
struct SessionSummaryRow {
    id: String,
    title: Option<String>,
    status: String,
    created_at: String,
    updated_at: String,
    message_count: i64,
}

impl SessionSummaryRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            status: row.try_get("status")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            message_count: row.try_get("message_count")?,
        })
    }

    fn into_summary(self) -> Result<SessionSummary, RepositoryError> {
        Ok(SessionSummary {
            id: parse_uuid(&self.id, "session id")?,
            title: self.title.unwrap_or_else(|| PLACEHOLDER_TITLE.to_string()),
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
            is_active: parse_status(&self.status)?.is_active(),
            message_count: self.message_count as u32,
        })
    }
}

struct ChatMessageRow {
    id: String,
    role: String,
    message_type: String,
    content: String,
    metadata: String,
    created_at: String,
}

impl ChatMessageRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            role: row.try_get("role")?,
            message_type: row.try_get("message_type")?,
            content: row.try_get("content")?,
            metadata: row.try_get("metadata")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_message(self) -> Result<ChatMessage, RepositoryError> {
        let role: ChatRole = self
            .role
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;
        let metadata: MessageMetadata = serde_json::from_str(&self.metadata)
            .map_err(|e| RepositoryError::Query(format!("invalid message metadata: {e}")))?;

        Ok(ChatMessage {
            id: parse_uuid(&self.id, "message id")?,
            content: self.content,
            role,
            message_type: self.message_type,
            created_at: parse_datetime(&self.created_at)?,
            metadata,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_uuid(s: &str, what: &str) -> Result<Uuid, RepositoryError> {
    Uuid::parse_str(s).map_err(|e| RepositoryError::Query(format!("invalid {what}: {e}")))
}

fn parse_status(s: &str) -> Result<SessionStatus, RepositoryError> {
    s.parse().map_err(|e: String| RepositoryError::Query(e))
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

/// Fixed-width RFC 3339 so that text ordering matches time ordering.
fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn to_json(map: &serde_json::Map<String, serde_json::Value>) -> Result<String, RepositoryError> {
    serde_json::to_string(map).map_err(|e| RepositoryError::Query(e.to_string()))
}

// ---------------------------------------------------------------------------
// SessionRepository implementation
// ---------------------------------------------------------------------------

impl SessionRepository for SqliteSessionRepository {
    async fn create_session(&self, session: &ChatSession) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"INSERT INTO chat_sessions (id, owner_id, title, context, status, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(session.id.to_string())
        .bind(session.owner_id.as_str())
        .bind(session.stored_title())
        .bind(to_json(&session.context)?)
        .bind(session.status().to_string())
        .bind(format_datetime(&session.created_at))
        .bind(format_datetime(&session.updated_at()))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.message().contains("UNIQUE") {
                    return RepositoryError::Conflict(format!("session {} already exists", session.id));
                }
            }
            RepositoryError::Query(e.to_string())
        })?;

        Ok(())
    }

    async fn get_session(
        &self,
        session_id: &Uuid,
        owner: &OwnerId,
    ) -> Result<Option<ChatSession>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM chat_sessions WHERE id = ? AND owner_id = ?")
            .bind(session_id.to_string())
            .bind(owner.as_str())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        self.load_session(row).await
    }

    async fn list_sessions(
        &self,
        owner: &OwnerId,
        active_only: bool,
    ) -> Result<Vec<SessionSummary>, RepositoryError> {
        let mut sql = String::from(
            r#"SELECT s.id, s.title, s.status, s.created_at, s.updated_at,
                      (SELECT COUNT(*) FROM chat_messages m WHERE m.session_id = s.id) AS message_count
               FROM chat_sessions s
               WHERE s.owner_id = ?"#,
        );
        if active_only {
            sql.push_str(" AND s.status = 'active'");
        }
        sql.push_str(" ORDER BY s.updated_at DESC, s.id DESC");

        let rows = sqlx::query(&sql)
            .bind(owner.as_str())
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut summaries = Vec::with_capacity(rows.len());
        for row in &rows {
            let summary_row =
                SessionSummaryRow::from_row(row).map_err(|e| RepositoryError::Query(e.to_string()))?;
            summaries.push(summary_row.into_summary()?);
        }

        Ok(summaries)
    }

    async fn latest_session(&self, owner: &OwnerId) -> Result<Option<ChatSession>, RepositoryError> {
        let row = sqlx::query(
            "SELECT * FROM chat_sessions WHERE owner_id = ? ORDER BY updated_at DESC, id DESC LIMIT 1",
        )
        .bind(owner.as_str())
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        self.load_session(row).await
    }

    async fn append_message(
        &self,
        session: &ChatSession,
        message: &ChatMessage,
    ) -> Result<(), RepositoryError> {
        // Session touch + message insert commit together or not at all.
        let mut tx = self
            .pool
            .writer
            .begin()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let result = sqlx::query(
            "UPDATE chat_sessions SET title = ?, updated_at = ? WHERE id = ? AND owner_id = ?",
        )
        .bind(session.stored_title())
        .bind(format_datetime(&session.updated_at()))
        .bind(session.id.to_string())
        .bind(session.owner_id.as_str())
        .execute(&mut *tx)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        sqlx::query(
            r#"INSERT INTO chat_messages (session_id, seq, id, role, message_type, content, metadata, created_at)
               VALUES (?, (SELECT COALESCE(MAX(seq), -1) + 1 FROM chat_messages WHERE session_id = ?), ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(session.id.to_string())
        .bind(session.id.to_string())
        .bind(message.id.to_string())
        .bind(message.role.to_string())
        .bind(&message.message_type)
        .bind(&message.content)
        .bind(to_json(&message.metadata)?)
        .bind(format_datetime(&message.created_at))
        .execute(&mut *tx)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn update_status(&self, session: &ChatSession) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE chat_sessions SET status = ?, updated_at = ? WHERE id = ? AND owner_id = ?",
        )
        .bind(session.status().to_string())
        .bind(format_datetime(&session.updated_at()))
        .bind(session.id.to_string())
        .bind(session.owner_id.as_str())
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn delete_session(&self, session_id: &Uuid, owner: &OwnerId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM chat_sessions WHERE id = ? AND owner_id = ?")
            .bind(session_id.to_string())
            .bind(owner.as_str())
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn delete_owner_sessions(&self, owner: &OwnerId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM chat_sessions WHERE owner_id = ?")
            .bind(owner.as_str())
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn test_repo() -> (tempfile::TempDir, SqliteSessionRepository) {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("test.db").display());
        let pool = DatabasePool::new(&url).await.unwrap();
        (dir, SqliteSessionRepository::new(pool))
    }

    /// Let the clock move past the previous write's microsecond.
    async fn pause() {
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    }

    fn alice() -> OwnerId {
        OwnerId::from("alice")
    }

    fn new_session(owner: OwnerId) -> ChatSession {
        let mut context = ContextMap::new();
        context.insert("sun_sign".into(), json!("Virgo"));
        ChatSession::new(owner, None, context)
    }

    async fn append(
        repo: &SqliteSessionRepository,
        session: &mut ChatSession,
        role: ChatRole,
        content: &str,
    ) -> Result<ChatMessage, RepositoryError> {
        let message = session.append(role, content.into(), MessageMetadata::new()).clone();
        repo.append_message(session, &message).await?;
        Ok(message)
    }

    #[tokio::test]
    async fn test_create_and_get_session() {
        let (_dir, repo) = test_repo().await;
        let session = new_session(alice());
        repo.create_session(&session).await.unwrap();

        let fetched = repo.get_session(&session.id, &alice()).await.unwrap().unwrap();
        assert_eq!(fetched.id, session.id);
        assert_eq!(fetched.title(), PLACEHOLDER_TITLE);
        assert!(fetched.stored_title().is_none());
        assert_eq!(fetched.context["sun_sign"], json!("Virgo"));
        assert!(fetched.is_active());
        assert_eq!(fetched.created_at, session.created_at);
        assert_eq!(fetched.updated_at(), session.updated_at());
        assert!(fetched.messages().is_empty());
    }

    #[tokio::test]
    async fn test_get_session_scoped_by_owner() {
        let (_dir, repo) = test_repo().await;
        let session = new_session(alice());
        repo.create_session(&session).await.unwrap();

        let foreign = repo.get_session(&session.id, &OwnerId::from("bob")).await.unwrap();
        assert!(foreign.is_none());
        assert!(repo.get_session(&Uuid::now_v7(), &alice()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_append_message_round_trip() {
        let (_dir, repo) = test_repo().await;
        let mut session = new_session(alice());
        repo.create_session(&session).await.unwrap();

        let mut metadata = MessageMetadata::new();
        metadata.insert("client_timestamp".into(), json!("2024-03-01T10:00:00Z"));
        let user = session
            .append(ChatRole::User, "Hello, how are you?".into(), metadata)
            .clone();
        repo.append_message(&session, &user).await.unwrap();
        let reply = append(&repo, &mut session, ChatRole::Assistant, "Glowing, thanks.")
            .await
            .unwrap();

        let fetched = repo.get_session(&session.id, &alice()).await.unwrap().unwrap();
        assert_eq!(fetched.messages(), &[user, reply]);
        assert_eq!(fetched.title(), "Hello, how are you?");
        assert_eq!(fetched.updated_at(), session.updated_at());
    }

    #[tokio::test]
    async fn test_append_to_missing_session_writes_nothing() {
        let (_dir, repo) = test_repo().await;
        let mut session = new_session(alice());
        repo.create_session(&session).await.unwrap();
        repo.delete_session(&session.id, &alice()).await.unwrap();

        let result = append(&repo, &mut session, ChatRole::User, "hi").await;
        assert!(matches!(result, Err(RepositoryError::NotFound)));

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM chat_messages")
            .fetch_one(&repo.pool.reader)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_append_by_foreign_owner_is_not_found() {
        let (_dir, repo) = test_repo().await;
        let session = new_session(alice());
        repo.create_session(&session).await.unwrap();

        let mut forged = ChatSession::restore(SessionRecord {
            id: session.id,
            owner_id: OwnerId::from("mallory"),
            title: None,
            context: ContextMap::new(),
            status: SessionStatus::Active,
            created_at: session.created_at,
            updated_at: session.updated_at(),
            messages: Vec::new(),
        });
        let result = append(&repo, &mut forged, ChatRole::User, "let me in").await;
        assert!(matches!(result, Err(RepositoryError::NotFound)));
    }

    #[tokio::test]
    async fn test_list_sessions_counts_and_orders() {
        let (_dir, repo) = test_repo().await;
        let mut first = new_session(alice());
        repo.create_session(&first).await.unwrap();
        let second = new_session(alice());
        repo.create_session(&second).await.unwrap();
        repo.create_session(&new_session(OwnerId::from("bob"))).await.unwrap();
        pause().await;

        append(&repo, &mut first, ChatRole::User, "one").await.unwrap();
        append(&repo, &mut first, ChatRole::Assistant, "two").await.unwrap();

        let summaries = repo.list_sessions(&alice(), false).await.unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].id, first.id);
        assert_eq!(summaries[0].message_count, 2);
        assert_eq!(summaries[0].title, "one");
        assert_eq!(summaries[1].id, second.id);
        assert_eq!(summaries[1].message_count, 0);
        assert_eq!(summaries[1].title, PLACEHOLDER_TITLE);
    }

    #[tokio::test]
    async fn test_list_active_only_and_status_update() {
        let (_dir, repo) = test_repo().await;
        let mut ended = new_session(alice());
        repo.create_session(&ended).await.unwrap();
        let open = new_session(alice());
        repo.create_session(&open).await.unwrap();
        pause().await;

        assert!(ended.set_active(false));
        repo.update_status(&ended).await.unwrap();

        let active = repo.list_sessions(&alice(), true).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, open.id);

        let all = repo.list_sessions(&alice(), false).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, ended.id);
        assert!(!all[0].is_active);
    }

    #[tokio::test]
    async fn test_latest_session_includes_messages() {
        let (_dir, repo) = test_repo().await;
        assert!(repo.latest_session(&alice()).await.unwrap().is_none());

        let mut older = new_session(alice());
        repo.create_session(&older).await.unwrap();
        let newer = new_session(alice());
        repo.create_session(&newer).await.unwrap();
        pause().await;
        append(&repo, &mut older, ChatRole::User, "revived").await.unwrap();

        let latest = repo.latest_session(&alice()).await.unwrap().unwrap();
        assert_eq!(latest.id, older.id);
        assert_eq!(latest.message_count(), 1);
    }

    #[tokio::test]
    async fn test_delete_session_cascades_messages() {
        let (_dir, repo) = test_repo().await;
        let mut session = new_session(alice());
        repo.create_session(&session).await.unwrap();
        append(&repo, &mut session, ChatRole::User, "bye").await.unwrap();

        let foreign = repo.delete_session(&session.id, &OwnerId::from("bob")).await;
        assert!(matches!(foreign, Err(RepositoryError::NotFound)));

        repo.delete_session(&session.id, &alice()).await.unwrap();
        assert!(repo.get_session(&session.id, &alice()).await.unwrap().is_none());

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM chat_messages")
            .fetch_one(&repo.pool.reader)
            .await
            .unwrap();
        assert_eq!(count, 0);

        let again = repo.delete_session(&session.id, &alice()).await;
        assert!(matches!(again, Err(RepositoryError::NotFound)));
    }

    #[tokio::test]
    async fn test_delete_owner_sessions() {
        let (_dir, repo) = test_repo().await;
        let mut mine = new_session(alice());
        repo.create_session(&mine).await.unwrap();
        append(&repo, &mut mine, ChatRole::User, "hi").await.unwrap();
        repo.create_session(&new_session(alice())).await.unwrap();
        repo.create_session(&new_session(OwnerId::from("bob"))).await.unwrap();

        assert_eq!(repo.delete_owner_sessions(&alice()).await.unwrap(), 2);
        assert!(repo.list_sessions(&alice(), false).await.unwrap().is_empty());
        assert_eq!(repo.list_sessions(&OwnerId::from("bob"), false).await.unwrap().len(), 1);
        assert_eq!(repo.delete_owner_sessions(&alice()).await.unwrap(), 0);
    }

    #[test]
    fn test_format_datetime_is_fixed_width() {
        let a = DateTime::parse_from_rfc3339("2024-03-01T10:00:00Z").unwrap().with_timezone(&Utc);
        let b = DateTime::parse_from_rfc3339("2024-03-01T10:00:00.5Z").unwrap().with_timezone(&Utc);
        assert_eq!(format_datetime(&a), "2024-03-01T10:00:00.000000Z");
        assert!(format_datetime(&a) < format_datetime(&b));
        assert_eq!(parse_datetime(&format_datetime(&b)).unwrap(), b);
    }
}
