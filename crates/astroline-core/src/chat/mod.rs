//! The chat session engine.
//!
//! - `repository`: persistence port implemented by astroline-infra
//! - `store`: session store contract (IDs, titles, timestamps, ownership)
//! - `context`: sliding-window prompt assembly
//! - `locks`: per-session mutual exclusion
//! - `service`: the session lifecycle orchestrator

pub mod context;
pub mod locks;
pub mod repository;
pub mod service;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;
