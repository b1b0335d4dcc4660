//! Peers Module
//!
//! Capabilities a group uses to reach other nodes: choosing the peer that
//! owns a key, and fetching a value from that peer.

mod http;
mod ring;

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

pub use http::{HttpGetter, HttpPool, DEFAULT_BASE_PATH, DEFAULT_REPLICAS};
pub use ring::{HashFn, HashRing};

// == Peer Picker ==
/// Chooses the remote peer that owns a key.
///
/// Implementations must return `None` when the owner is the local node,
/// otherwise a group would fetch from itself in a loop.
pub trait PeerPicker: Send + Sync {
    fn pick_peer(&self, key: &str) -> Option<Arc<dyn PeerGetter>>;
}

// == Peer Getter ==
/// Fetches the raw bytes for `key` in `group` from one peer.
#[async_trait]
pub trait PeerGetter: Send + Sync {
    async fn get(&self, group: &str, key: &str) -> Result<Bytes>;
}
