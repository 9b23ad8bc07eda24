//! LlmProvider trait definition.
//!
//! This is the core abstraction that every generative-text backend
//! implements. Uses RPITIT for `complete` (native async fn in traits,
//! Rust 2024 edition).

use astroline_types::llm::{CompletionRequest, CompletionResponse, LlmError};

/// Trait for generative-text provider backends (Gemini, test doubles).
///
/// Implementations live in astroline-infra (e.g., `GeminiProvider`).
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g., "gemini").
    fn name(&self) -> &str;

    /// Send a completion request and receive the full response.
    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl std::future::Future<Output = Result<CompletionResponse, LlmError>> + Send;
}
