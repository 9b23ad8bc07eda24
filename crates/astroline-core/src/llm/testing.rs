//! Scripted LlmProvider test double.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use astroline_types::llm::{
    CompletionRequest, CompletionResponse, LlmError, MessageRole, StopReason, Usage,
};

use super::provider::LlmProvider;

/// What the scripted provider does on every call.
#[derive(Clone)]
pub(crate) enum Script {
    /// Reply with a fixed text.
    Reply(String),
    /// Reply with "re: <last user message>".
    Echo,
    /// Fail with a provider error.
    Fail,
}

/// Provider double that records every request it receives.
#[derive(Clone)]
pub(crate) struct ScriptedProvider {
    script: Script,
    delay: Option<Duration>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl ScriptedProvider {
    pub(crate) fn new(script: Script) -> Self {
        Self {
            script,
            delay: None,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.requests.lock().unwrap().push(request.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let content = match &self.script {
            Script::Reply(text) => text.clone(),
            Script::Echo => {
                let last_user = request
                    .messages
                    .iter()
                    .rev()
                    .find(|m| m.role == MessageRole::User)
                    .map(|m| m.content.clone())
                    .unwrap_or_default();
                format!("re: {last_user}")
            }
            Script::Fail => {
                return Err(LlmError::Provider {
                    message: "HTTP 503: unavailable".to_string(),
                });
            }
        };

        Ok(CompletionResponse {
            content,
            model: request.model.clone(),
            stop_reason: StopReason::EndTurn,
            usage: Usage::default(),
        })
    }
}
