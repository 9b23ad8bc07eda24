//! Chat session and message types for Astroline.
//!
//! A [`ChatSession`] owns its messages as an append-only log. The only way to
//! add a message is [`ChatSession::append`]; there is no operation that edits
//! or removes a message once it is in the log.

use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

use crate::llm::MessageRole;

/// Title shown for a session that has not been titled yet.
pub const PLACEHOLDER_TITLE: &str = "New Chat";

/// Maximum number of characters kept when deriving a title from a message.
pub const MAX_DERIVED_TITLE_CHARS: usize = 50;

/// Content-kind label stored on every message unless a caller says otherwise.
pub const DEFAULT_MESSAGE_TYPE: &str = "text";

/// Free-form string keys mapped to scalar values, injected into prompts.
pub type ContextMap = serde_json::Map<String, serde_json::Value>;

/// Auxiliary per-message data (client send time, generation details).
pub type MessageMetadata = serde_json::Map<String, serde_json::Value>;

/// The authenticated identity that owns a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(pub String);

impl OwnerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OwnerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Who authored a chat message.
///
/// Only the two conversational roles are representable here. The system
/// instruction exists solely in the prompt sent to the model and is never
/// stored in a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl fmt::Display for ChatRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatRole::User => write!(f, "user"),
            ChatRole::Assistant => write!(f, "assistant"),
        }
    }
}

impl FromStr for ChatRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(ChatRole::User),
            "assistant" => Ok(ChatRole::Assistant),
            other => Err(format!("invalid chat role: '{other}'")),
        }
    }
}

impl From<ChatRole> for MessageRole {
    fn from(role: ChatRole) -> Self {
        match role {
            ChatRole::User => MessageRole::User,
            ChatRole::Assistant => MessageRole::Assistant,
        }
    }
}

/// Lifecycle status of a chat session.
///
/// Maps to the CHECK constraint in the SQLite schema:
/// `CHECK (status IN ('active', 'ended'))`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    #[default]
    Active,
    Ended,
}

impl SessionStatus {
    pub fn is_active(self) -> bool {
        self == SessionStatus::Active
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::Active => write!(f, "active"),
            SessionStatus::Ended => write!(f, "ended"),
        }
    }
}

impl FromStr for SessionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(SessionStatus::Active),
            "ended" => Ok(SessionStatus::Ended),
            other => Err(format!("invalid session status: '{other}'")),
        }
    }
}

/// A single message within a chat session.
///
/// Messages have no identity outside their session; `id` is only unique
/// within the owning session's log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub content: String,
    pub role: ChatRole,
    /// Content-kind label (e.g. "text"); independent of `role`.
    pub message_type: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub metadata: MessageMetadata,
}

/// A conversation between one owner and the assistant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: Uuid,
    pub owner_id: OwnerId,
    /// `None` until a title is supplied or derived from the first user message.
    title: Option<String>,
    pub context: ContextMap,
    status: SessionStatus,
    pub created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    messages: Vec<ChatMessage>,
}

/// Stored fields of a session, used by repositories to rebuild a
/// [`ChatSession`] from persistence.
#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub id: Uuid,
    pub owner_id: OwnerId,
    pub title: Option<String>,
    pub context: ContextMap,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub messages: Vec<ChatMessage>,
}

/// List view of a session: everything except the message log itself.
///
/// This is also the wire shape returned by the create and list endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: Uuid,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_active: bool,
    pub message_count: u32,
}

impl ChatSession {
    /// Start a new active session with an empty log.
    ///
    /// A blank `title` is treated the same as no title.
    pub fn new(owner_id: OwnerId, title: Option<String>, context: ContextMap) -> Self {
        let now = Utc::now().trunc_subsecs(6);
        let title = title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        Self {
            id: Uuid::now_v7(),
            owner_id,
            title,
            context,
            status: SessionStatus::Active,
            created_at: now,
            updated_at: now,
            messages: Vec::new(),
        }
    }

    /// Rebuild a session from its stored fields.
    pub fn restore(record: SessionRecord) -> Self {
        Self {
            id: record.id,
            owner_id: record.owner_id,
            title: record.title,
            context: record.context,
            status: record.status,
            created_at: record.created_at,
            updated_at: record.updated_at,
            messages: record.messages,
        }
    }

    /// Display title, falling back to [`PLACEHOLDER_TITLE`].
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or(PLACEHOLDER_TITLE)
    }

    /// The stored title, `None` while the session is untitled.
    pub fn stored_title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// The message log in conversation order.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// Append a message to the log and return it.
    ///
    /// Derives the title from the first user message when the session is
    /// untitled, and advances `updated_at`. The message timestamp equals the
    /// new `updated_at`.
    pub fn append(
        &mut self,
        role: ChatRole,
        content: String,
        metadata: MessageMetadata,
    ) -> &ChatMessage {
        let now = self.touch();

        if self.title.is_none() && role == ChatRole::User {
            self.title = Some(derive_title(&content));
        }

        self.messages.push(ChatMessage {
            id: Uuid::now_v7(),
            content,
            role,
            message_type: DEFAULT_MESSAGE_TYPE.to_string(),
            created_at: now,
            metadata,
        });

        // Just pushed, so the log is non-empty.
        &self.messages[self.messages.len() - 1]
    }

    /// Set the active flag. Returns `false` (and changes nothing) when the
    /// session is already in the requested state.
    pub fn set_active(&mut self, active: bool) -> bool {
        let status = if active {
            SessionStatus::Active
        } else {
            SessionStatus::Ended
        };
        if self.status == status {
            return false;
        }
        self.status = status;
        self.touch();
        true
    }

    /// Summary view used by list/create responses.
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id,
            title: self.title().to_string(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            is_active: self.is_active(),
            message_count: self.messages.len() as u32,
        }
    }

    /// Advance `updated_at` so that it strictly increases, even when the
    /// wall clock has not moved (or moved backwards) since the last mutation.
    fn touch(&mut self) -> DateTime<Utc> {
        self.updated_at = next_timestamp(self.updated_at);
        self.updated_at
    }
}

/// `max(now, previous + 1µs)` at microsecond precision.
pub fn next_timestamp(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now().trunc_subsecs(6);
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}

/// Derive a session title from the first user message: the first 50
/// characters, with "..." appended when the message was longer.
pub fn derive_title(content: &str) -> String {
    let mut chars = content.chars();
    let head: String = chars.by_ref().take(MAX_DERIVED_TITLE_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

/// Check that every context value is a scalar (string, number, bool, null).
pub fn validate_context(context: &ContextMap) -> Result<(), String> {
    for (key, value) in context {
        if value.is_object() || value.is_array() {
            return Err(format!(
                "context value for '{key}' must be a string, number, boolean or null"
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn session() -> ChatSession {
        ChatSession::new(OwnerId::from("user-1"), None, ContextMap::new())
    }

    #[test]
    fn test_session_status_roundtrip() {
        for status in [SessionStatus::Active, SessionStatus::Ended] {
            let s = status.to_string();
            let parsed: SessionStatus = s.parse().unwrap();
            assert_eq!(status, parsed);
        }
    }

    #[test]
    fn test_chat_role_rejects_system() {
        assert!("system".parse::<ChatRole>().is_err());
        assert_eq!("Assistant".parse::<ChatRole>().unwrap(), ChatRole::Assistant);
    }

    #[test]
    fn test_new_session_defaults() {
        let s = session();
        assert_eq!(s.title(), PLACEHOLDER_TITLE);
        assert!(s.stored_title().is_none());
        assert!(s.is_active());
        assert_eq!(s.message_count(), 0);
        assert_eq!(s.created_at, s.updated_at());
    }

    #[test]
    fn test_blank_title_counts_as_omitted() {
        let s = ChatSession::new(OwnerId::from("u"), Some("   ".into()), ContextMap::new());
        assert!(s.stored_title().is_none());
    }

    #[test]
    fn test_title_derived_from_first_user_message() {
        let mut s = session();
        s.append(ChatRole::User, "Hello, how are you?".into(), MessageMetadata::new());
        assert_eq!(s.title(), "Hello, how are you?");

        s.append(ChatRole::User, "Something else".into(), MessageMetadata::new());
        assert_eq!(s.title(), "Hello, how are you?");
    }

    #[test]
    fn test_long_title_truncated_to_fifty_chars() {
        let mut s = session();
        s.append(ChatRole::User, "A".repeat(60), MessageMetadata::new());
        assert_eq!(s.title(), format!("{}...", "A".repeat(50)));
    }

    #[test]
    fn test_title_exactly_fifty_chars_not_truncated() {
        assert_eq!(derive_title(&"B".repeat(50)), "B".repeat(50));
    }

    #[test]
    fn test_derive_title_counts_characters_not_bytes() {
        let text = "♈".repeat(51);
        let title = derive_title(&text);
        assert_eq!(title, format!("{}...", "♈".repeat(50)));
    }

    #[test]
    fn test_assistant_message_does_not_set_title() {
        let mut s = session();
        s.append(ChatRole::Assistant, "Welcome".into(), MessageMetadata::new());
        assert!(s.stored_title().is_none());
    }

    #[test]
    fn test_explicit_title_is_kept() {
        let mut s = ChatSession::new(OwnerId::from("u"), Some("Mercury".into()), ContextMap::new());
        s.append(ChatRole::User, "Tell me about retrogrades".into(), MessageMetadata::new());
        assert_eq!(s.title(), "Mercury");
    }

    #[test]
    fn test_append_strictly_increases_updated_at() {
        let mut s = session();
        let mut last = s.updated_at();
        for i in 0..20 {
            s.append(ChatRole::User, format!("m{i}"), MessageMetadata::new());
            assert!(s.updated_at() > last);
            assert_eq!(s.messages().last().unwrap().created_at, s.updated_at());
            last = s.updated_at();
        }
        assert!(s.updated_at() >= s.created_at);
    }

    #[test]
    fn test_append_preserves_order_and_message_type() {
        let mut s = session();
        s.append(ChatRole::User, "one".into(), MessageMetadata::new());
        s.append(ChatRole::Assistant, "two".into(), MessageMetadata::new());
        let roles: Vec<ChatRole> = s.messages().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![ChatRole::User, ChatRole::Assistant]);
        assert!(s.messages().iter().all(|m| m.message_type == "text"));
    }

    #[test]
    fn test_set_active_is_idempotent() {
        let mut s = session();
        assert!(s.set_active(false));
        let ended_at = s.updated_at();
        assert!(!s.set_active(false));
        assert_eq!(s.updated_at(), ended_at);
        assert_eq!(s.status(), SessionStatus::Ended);
    }

    #[test]
    fn test_summary_message_count() {
        let mut s = session();
        s.append(ChatRole::User, "hi".into(), MessageMetadata::new());
        s.append(ChatRole::Assistant, "hello".into(), MessageMetadata::new());
        let summary = s.summary();
        assert_eq!(summary.message_count, 2);
        assert_eq!(summary.title, "hi");
        assert!(summary.is_active);
    }

    #[test]
    fn test_validate_context() {
        let mut ctx = ContextMap::new();
        ctx.insert("sun_sign".into(), json!("Leo"));
        ctx.insert("age".into(), json!(31));
        ctx.insert("premium".into(), json!(true));
        assert!(validate_context(&ctx).is_ok());

        ctx.insert("planets".into(), json!(["Mars"]));
        let err = validate_context(&ctx).unwrap_err();
        assert!(err.contains("planets"));
    }

    #[test]
    fn test_message_serializes_wire_shape() {
        let mut s = session();
        let msg = s
            .append(ChatRole::Assistant, "Hi".into(), MessageMetadata::new())
            .clone();
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["role"], "assistant");
        assert_eq!(value["message_type"], "text");
        assert!(value["metadata"].is_object());
        assert!(value["created_at"].is_string());
    }
}
