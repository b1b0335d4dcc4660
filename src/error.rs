//! Error types for the cache node
//!
//! Provides unified error handling using thiserror.

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Unified error type for groups, peers and the HTTP surface.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Empty key passed to `Group::get`
    #[error("key is required")]
    KeyRequired,

    /// Malformed peer request path
    #[error("bad request: {0}")]
    BadRequest(String),

    /// No group registered under this name
    #[error("no such group: {0}")]
    GroupNotFound(String),

    /// The loader failed; its error is carried through unchanged
    #[error(transparent)]
    Loader(#[from] anyhow::Error),

    /// Transport error or non-success response from a peer
    #[error("peer error: {0}")]
    Peer(String),

    /// Peer did not answer within the deadline
    #[error("peer timed out after {0:?}")]
    PeerTimeout(Duration),
}

impl From<reqwest::Error> for CacheError {
    fn from(err: reqwest::Error) -> Self {
        CacheError::Peer(err.to_string())
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::KeyRequired | CacheError::BadRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::GroupNotFound(_) => StatusCode::NOT_FOUND,
            CacheError::Loader(_) => StatusCode::INTERNAL_SERVER_ERROR,
            CacheError::Peer(_) => StatusCode::BAD_GATEWAY,
            CacheError::PeerTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache node.
pub type Result<T> = std::result::Result<T, CacheError>;
