//! Request DTOs for the node's JSON endpoints
//!
//! Defines the structure of incoming query strings.

use serde::Deserialize;

/// Query string for `GET /api/:group?key=...`
#[derive(Debug, Clone, Deserialize)]
pub struct ApiQuery {
    /// The cache key
    #[serde(default)]
    pub key: String,
}
