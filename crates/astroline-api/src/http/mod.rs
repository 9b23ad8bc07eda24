//! HTTP/REST API layer for Astroline.
//!
//! Axum-based REST API at `/api/v1/` with bearer-token authentication
//! and CORS support.

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod router;
