//! Google Gemini LLM provider implementation.
//!
//! This module provides the [`GeminiProvider`] which implements the
//! [`LlmProvider`](astroline_core::llm::provider::LlmProvider) trait for
//! the Generative Language API (`generateContent`).

pub mod client;
pub mod types;

pub use client::GeminiProvider;
