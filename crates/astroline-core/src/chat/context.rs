//! Prompt assembly for chat turns.
//!
//! Builds the ordered message sequence sent to the response generator:
//!
//! ```text
//! [system instruction (+ context block), ...last N prior messages, live utterance]
//! ```
//!
//! Only the most recent `history_window` messages are included. Full history
//! is read from the session store, never through this module.

use astroline_types::chat::{ChatMessage, ContextMap};
use astroline_types::llm::Message;
use serde_json::Value;

/// Number of prior messages included when no window is configured.
pub const DEFAULT_HISTORY_WINDOW: usize = 5;

const PERSONA: &str = "You are an AI assistant trained to provide helpful and informative responses.\n\
Maintain a professional and supportive tone in your responses.";

const CLOSING: &str = "Keep responses clear, concise, and relevant to the user's query.";

/// Assembles generation prompts with a sliding history window.
#[derive(Debug, Clone)]
pub struct ContextAssembler {
    history_window: usize,
}

impl Default for ContextAssembler {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_WINDOW)
    }
}

impl ContextAssembler {
    pub fn new(history_window: usize) -> Self {
        Self { history_window }
    }

    pub fn history_window(&self) -> usize {
        self.history_window
    }

    /// Build the prompt for one turn.
    ///
    /// `prior` must be the session log as it was before the live utterance
    /// was appended; the utterance is added exactly once, last.
    pub fn assemble(&self, context: &ContextMap, prior: &[ChatMessage], utterance: &str) -> Vec<Message> {
        let start = prior.len().saturating_sub(self.history_window);
        let window = &prior[start..];

        let mut prompt = Vec::with_capacity(window.len() + 2);
        prompt.push(Message::system(Self::system_prompt(context)));
        prompt.extend(window.iter().map(|m| Message {
            role: m.role.into(),
            content: m.content.clone(),
        }));
        prompt.push(Message::user(utterance));
        prompt
    }

    /// Fixed persona instruction with the rendered context block, if any.
    pub fn system_prompt(context: &ContextMap) -> String {
        match Self::render_context(context) {
            Some(block) => format!("{PERSONA}\n{block}\n\n{CLOSING}"),
            None => format!("{PERSONA}\n\n{CLOSING}"),
        }
    }

    /// Render the context as a `key: value` list under a header, keys sorted.
    /// Returns `None` for an empty context.
    pub fn render_context(context: &ContextMap) -> Option<String> {
        if context.is_empty() {
            return None;
        }

        let mut entries: Vec<(&String, &Value)> = context.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));

        let lines: Vec<String> = entries
            .into_iter()
            .map(|(key, value)| match value {
                Value::String(s) => format!("{key}: {s}"),
                other => format!("{key}: {other}"),
            })
            .collect();

        Some(format!("Context Information:\n{}", lines.join("\n")))
    }
}
