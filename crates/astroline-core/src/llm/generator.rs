//! Response generation with a fixed fallback reply.
//!
//! `ResponseGenerator` sends an assembled prompt to the injected provider and
//! normalizes the reply. Any failure -- transport error, provider error,
//! malformed or empty output, timeout -- is logged and replaced by the
//! configured fallback text. There is no retry.

use std::time::{Duration, Instant};

use astroline_types::config::{ChatConfig, ProviderSettings, DEFAULT_FALLBACK_REPLY};
use astroline_types::llm::{CompletionRequest, LlmError, Message};
use tracing::{debug, warn};

use super::box_provider::BoxLlmProvider;

/// Request parameters for every generation call.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: Option<f64>,
    pub timeout: Duration,
    pub fallback_reply: String,
}

impl GeneratorConfig {
    pub fn from_settings(provider: &ProviderSettings, chat: &ChatConfig) -> Self {
        Self {
            model: provider.model.clone(),
            max_tokens: provider.max_output_tokens,
            temperature: provider.temperature,
            timeout: Duration::from_secs(provider.timeout_secs),
            fallback_reply: chat.fallback_reply.clone(),
        }
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self::from_settings(&ProviderSettings::default(), &ChatConfig::default())
    }
}

/// Outcome of one generation call. Always carries reply text.
#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    pub content: String,
    pub model: String,
    pub response_ms: u64,
    /// True when `content` is the fallback reply.
    pub degraded: bool,
}

/// Produces assistant replies from a provider handle.
///
/// Holds no session state; safe to share across concurrent requests.
pub struct ResponseGenerator {
    provider: BoxLlmProvider,
    config: GeneratorConfig,
}

impl ResponseGenerator {
    pub fn new(provider: BoxLlmProvider, config: GeneratorConfig) -> Self {
        Self { provider, config }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Generate a reply for `prompt` (system, history..., user in that order).
    #[tracing::instrument(
        name = "generate_reply",
        skip(self, prompt),
        fields(
            gen_ai.operation.name = "chat",
            gen_ai.provider.name = %self.provider.name(),
            gen_ai.request.model = %self.config.model,
            prompt_messages = prompt.len(),
        )
    )]
    pub async fn generate(&self, prompt: Vec<Message>) -> Generation {
        let started = Instant::now();
        let result = self.call_provider(prompt).await;
        let response_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(content) => {
                debug!(response_ms, chars = content.len(), "reply generated");
                Generation {
                    content,
                    model: self.config.model.clone(),
                    response_ms,
                    degraded: false,
                }
            }
            Err(err) => {
                warn!(
                    provider = %self.provider.name(),
                    error = %err,
                    response_ms,
                    "generation failed, substituting fallback reply"
                );
                Generation {
                    content: self.fallback_reply().to_string(),
                    model: self.config.model.clone(),
                    response_ms,
                    degraded: true,
                }
            }
        }
    }

    async fn call_provider(&self, prompt: Vec<Message>) -> Result<String, LlmError> {
        let request = CompletionRequest {
            model: self.config.model.clone(),
            messages: prompt,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let response = tokio::time::timeout(self.config.timeout, self.provider.complete(&request))
            .await
            .map_err(|_| LlmError::Timeout(self.config.timeout.as_millis() as u64))??;

        let text = response.content.trim();
        if text.is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        Ok(text.to_string())
    }

    fn fallback_reply(&self) -> &str {
        if self.config.fallback_reply.trim().is_empty() {
            DEFAULT_FALLBACK_REPLY
        } else {
            &self.config.fallback_reply
        }
    }
}
