//! Service configuration types for Astroline.
//!
//! `ServiceConfig` represents the top-level `config.toml` that controls the
//! chat window, the generative-text provider, and the HTTP server.

use serde::{Deserialize, Serialize};

/// Top-level configuration for the Astroline service.
///
/// Loaded from `~/.astroline/config.toml`. All fields have sensible defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub chat: ChatConfig,

    #[serde(default)]
    pub provider: ProviderSettings,

    #[serde(default)]
    pub server: ServerConfig,
}

/// Conversation engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Number of prior messages included in each generation prompt.
    #[serde(default = "default_history_window")]
    pub history_window: usize,

    /// Reply stored when the provider fails.
    #[serde(default = "default_fallback_reply")]
    pub fallback_reply: String,
}

/// Generative-text provider settings. The API key is not part of this file;
/// it comes from the environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSettings {
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Upper bound on a single generation call.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    #[serde(default)]
    pub temperature: Option<f64>,
}

/// HTTP server settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Allowed CORS origins. Empty means any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

pub const DEFAULT_FALLBACK_REPLY: &str = "I apologize, but I'm having trouble generating a response right now. Please try again in a moment.";

fn default_history_window() -> usize {
    5
}

fn default_fallback_reply() -> String {
    DEFAULT_FALLBACK_REPLY.to_string()
}

fn default_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_output_tokens() -> u32 {
    1024
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            history_window: default_history_window(),
            fallback_reply: default_fallback_reply(),
        }
    }
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            model: default_model(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            max_output_tokens: default_max_output_tokens(),
            temperature: None,
        }
    }
}
