//! GeminiProvider -- concrete [`LlmProvider`] implementation for Google Gemini.
//!
//! Sends non-streaming requests to
//! `{base_url}/v1beta/models/{model}:generateContent`. System turns become
//! the request's `systemInstruction`; assistant turns use the `model` role.
//!
//! The API key is wrapped in [`secrecy::SecretString`] and is only exposed
//! in the `x-goog-api-key` header.

use secrecy::{ExposeSecret, SecretString};

use astroline_core::llm::provider::LlmProvider;
use astroline_types::llm::{
    CompletionRequest, CompletionResponse, LlmError, MessageRole, StopReason, Usage,
};

use super::types::{
    GeminiContent, GeminiErrorBody, GeminiPart, GeminiRequest, GeminiResponse, GenerationConfig,
};

/// Default Generative Language API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Google Gemini LLM provider.
///
/// Deliberately has no `Debug` impl; the key never reaches logs.
pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
}

impl GeminiProvider {
    pub fn new(api_key: SecretString) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| LlmError::Provider {
                message: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Override the base URL (useful for testing or proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn url(&self, model: &str) -> String {
        format!("{}/v1beta/models/{model}:generateContent", self.base_url)
    }

    /// Convert a generic [`CompletionRequest`] into a [`GeminiRequest`].
    ///
    /// Multiple system messages are joined into one instruction.
    fn to_gemini_request(request: &CompletionRequest) -> GeminiRequest {
        let mut system = Vec::new();
        let mut contents = Vec::with_capacity(request.messages.len());

        for message in &request.messages {
            let role = match message.role {
                MessageRole::System => {
                    system.push(message.content.as_str());
                    continue;
                }
                MessageRole::User => "user",
                MessageRole::Assistant => "model",
            };
            contents.push(GeminiContent {
                role: Some(role.to_string()),
                parts: vec![text_part(&message.content)],
            });
        }

        let system_instruction = (!system.is_empty()).then(|| GeminiContent {
            role: None,
            parts: vec![text_part(&system.join("\n\n"))],
        });

        GeminiRequest {
            system_instruction,
            contents,
            generation_config: GenerationConfig {
                max_output_tokens: request.max_tokens,
                temperature: request.temperature,
            },
        }
    }

    /// Normalize a `generateContent` body. A blocked prompt or a first
    /// candidate without text is an error.
    fn from_gemini_response(
        response: GeminiResponse,
        requested_model: &str,
    ) -> Result<CompletionResponse, LlmError> {
        let Some(candidate) = response.candidates.into_iter().next() else {
            let reason = response
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .unwrap_or_else(|| "no candidates returned".to_string());
            return Err(LlmError::Blocked(reason));
        };

        let content: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        let stop_reason = match candidate.finish_reason.as_deref() {
            Some("STOP") | None => StopReason::EndTurn,
            Some("MAX_TOKENS") => StopReason::MaxTokens,
            Some("SAFETY") | Some("PROHIBITED_CONTENT") | Some("BLOCKLIST") => StopReason::Safety,
            Some(_) => StopReason::Other,
        };

        if content.trim().is_empty() {
            return Err(match stop_reason {
                StopReason::Safety => LlmError::Blocked("candidate blocked by safety filters".into()),
                _ => LlmError::EmptyResponse,
            });
        }

        let usage = response
            .usage_metadata
            .map(|u| Usage {
                input_tokens: u.prompt_token_count,
                output_tokens: u.candidates_token_count,
            })
            .unwrap_or_default();

        Ok(CompletionResponse {
            content,
            model: response
                .model_version
                .unwrap_or_else(|| requested_model.to_string()),
            stop_reason,
            usage,
        })
    }
}

fn text_part(text: &str) -> GeminiPart {
    GeminiPart {
        text: Some(text.to_string()),
    }
}

/// Map a non-2xx status and body to an [`LlmError`].
fn error_for_status(status: reqwest::StatusCode, body: &str) -> LlmError {
    let detail = serde_json::from_str::<GeminiErrorBody>(body)
        .map(|b| b.error.message)
        .unwrap_or_else(|_| body.to_string());

    match status.as_u16() {
        401 | 403 => LlmError::AuthenticationFailed,
        429 => LlmError::RateLimited,
        400 | 404 => LlmError::InvalidRequest(detail),
        503 => LlmError::Overloaded(detail),
        _ => LlmError::Provider {
            message: format!("HTTP {status}: {detail}"),
        },
    }
}

impl LlmProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let body = Self::to_gemini_request(request);

        let response = self
            .client
            .post(self.url(&request.model))
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Provider {
                message: format!("HTTP request failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(error_for_status(status, &error_body));
        }

        let gemini_resp: GeminiResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Deserialization(format!("failed to parse response: {e}")))?;

        Self::from_gemini_response(gemini_resp, &request.model)
    }
}
