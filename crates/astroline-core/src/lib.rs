//! Business logic and port definitions for Astroline.
//!
//! This crate defines the "ports" (repository and provider traits) that the
//! infrastructure layer implements. It depends only on `astroline-types` --
//! never on `astroline-infra` or any database/IO crate.

pub mod chat;
pub mod llm;
