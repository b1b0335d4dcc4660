//! API Handlers
//!
//! HTTP request handlers for the peer protocol and the node's JSON endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use tracing::debug;

use crate::error::{CacheError, Result};
use crate::group::GroupRegistry;
use crate::models::{ApiQuery, GetResponse, HealthResponse, StatsResponse};
use crate::peers::DEFAULT_BASE_PATH;

/// Application state shared across all handlers.
///
/// Holds the group registry; groups are created by the caller before the
/// router starts serving.
#[derive(Clone)]
pub struct AppState {
    /// Groups served by this node
    pub registry: Arc<GroupRegistry>,
    /// Path prefix of the peer protocol, starting and ending with `/`
    pub base_path: String,
}

impl AppState {
    /// Creates a new AppState serving peers under the default base path.
    pub fn new(registry: Arc<GroupRegistry>) -> Self {
        Self {
            registry,
            base_path: DEFAULT_BASE_PATH.to_string(),
        }
    }

    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = base_path.into();
        self
    }
}

/// Handler for GET {base_path}<group>/<key>
///
/// Serves a peer's request with the raw value bytes. Only the first `/`
/// separates the group from the key.
pub async fn peer_handler(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<Response> {
    debug!("Peer request {}{}", state.base_path, path);

    let (group_name, key) = path
        .split_once('/')
        .ok_or_else(|| CacheError::BadRequest(format!("expected <group>/<key>, got {}", path)))?;

    let group = state
        .registry
        .get(group_name)
        .ok_or_else(|| CacheError::GroupNotFound(group_name.to_string()))?;

    let view = group.get(key).await?;

    Ok((
        [(header::CONTENT_TYPE, "application/octet-stream")],
        view.into_bytes(),
    )
        .into_response())
}

/// Handler for GET /api/:group?key=...
///
/// Reads a key through the group and returns it as JSON.
pub async fn api_handler(
    State(state): State<AppState>,
    Path(group_name): Path<String>,
    Query(query): Query<ApiQuery>,
) -> Result<Json<GetResponse>> {
    let group = state
        .registry
        .get(&group_name)
        .ok_or_else(|| CacheError::GroupNotFound(group_name.clone()))?;

    let view = group.get(&query.key).await?;

    Ok(Json(GetResponse::new(group_name, query.key, view.as_bytes())))
}

/// Handler for GET /stats/:group
///
/// Returns the group's counters.
pub async fn stats_handler(
    State(state): State<AppState>,
    Path(group_name): Path<String>,
) -> Result<Json<StatsResponse>> {
    let group = state
        .registry
        .get(&group_name)
        .ok_or_else(|| CacheError::GroupNotFound(group_name.clone()))?;

    Ok(Json(StatsResponse::new(
        group_name,
        group.cache_bytes(),
        group.stats(),
    )))
}

/// Handler for GET /health
///
/// Returns health status of the node.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
