//! Query parameter extractors for list endpoints.

use serde::Deserialize;

/// Query parameters for the session list endpoint.
#[derive(Debug, Deserialize)]
pub struct SessionListQuery {
    /// Only return sessions that have not been ended.
    #[serde(default = "default_active_only")]
    pub active_only: bool,
}

impl Default for SessionListQuery {
    fn default() -> Self {
        Self {
            active_only: default_active_only(),
        }
    }
}

fn default_active_only() -> bool {
    true
}
