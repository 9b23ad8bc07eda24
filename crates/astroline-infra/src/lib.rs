//! Infrastructure layer for Astroline.
//!
//! Contains implementations of the ports defined in `astroline-core`:
//! SQLite session storage, the Gemini provider, and the configuration loader.

pub mod config;
pub mod llm;
pub mod sqlite;
