//! Shared domain types for Astroline.
//!
//! This crate contains the core domain types used across the Astroline chat
//! backend: chat sessions and messages, LLM request shapes, service
//! configuration, and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod chat;
pub mod config;
pub mod error;
pub mod llm;
