//! Request extractors: caller identity and query parameters.

pub mod auth;
pub mod query;
