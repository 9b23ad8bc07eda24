//! LLM provider implementations.
//!
//! Contains the concrete [`LlmProvider`](astroline_core::llm::provider::LlmProvider)
//! implementation for Google Gemini and the factory ([`create_provider`]) that
//! builds it from [`ProviderSettings`] at startup.

pub mod gemini;

use secrecy::SecretString;

use astroline_core::llm::box_provider::BoxLlmProvider;
use astroline_types::config::ProviderSettings;
use astroline_types::llm::LlmError;

use self::gemini::GeminiProvider;

/// Create a [`BoxLlmProvider`] from provider settings and the API key.
///
/// # Errors
///
/// Returns [`LlmError::AuthenticationFailed`] when no API key is available.
pub fn create_provider(
    settings: &ProviderSettings,
    api_key: Option<SecretString>,
) -> Result<BoxLlmProvider, LlmError> {
    let key = api_key.ok_or(LlmError::AuthenticationFailed)?;
    let provider = GeminiProvider::new(key)?.with_base_url(settings.base_url.clone());
    Ok(BoxLlmProvider::new(provider))
}
