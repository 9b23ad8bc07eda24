//! LLM provider abstractions for Astroline.
//!
//! - `LlmProvider`: RPITIT trait for concrete provider implementations
//! - `BoxLlmProvider`: Object-safe wrapper for dynamic dispatch
//! - `ResponseGenerator`: turns a prompt into a reply, never failing

pub mod box_provider;
pub mod generator;
pub mod provider;

#[cfg(test)]
pub(crate) mod testing;
