use thiserror::Error;

/// Errors from repository operations (used by trait definitions in astroline-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Errors surfaced by the chat engine to its callers.
///
/// Generation failures are deliberately absent: they are absorbed into a
/// fallback assistant reply and never reach this type.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Session absent, not owned by the caller, or the ID was malformed.
    #[error("chat session not found")]
    NotFound,

    #[error("chat session is no longer active")]
    InvalidState,

    #[error("invalid request: {0}")]
    Validation(String),

    #[error("persistence failure: {0}")]
    Persistence(String),
}

impl From<RepositoryError> for ChatError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound => ChatError::NotFound,
            other => ChatError::Persistence(other.to_string()),
        }
    }
}
