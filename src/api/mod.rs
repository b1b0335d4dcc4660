//! API Module
//!
//! HTTP handlers and routing for a cache node.
//!
//! # Endpoints
//! - `GET /_geecache/<group>/<key>` - Peer protocol (raw bytes)
//! - `GET /api/:group?key=` - Read a key as JSON
//! - `GET /stats/:group` - Group statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
