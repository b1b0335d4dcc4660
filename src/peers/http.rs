//! HTTP Peer Pool
//!
//! Client side of the peer protocol. A request for `key` in `group` is sent
//! to `<peer><base_path><group>/<key>` and the response body is the raw
//! value. The server side lives in [`crate::api::peer_handler`].

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;
use reqwest::{Client, StatusCode, Url};
use tracing::{debug, info, warn};

use crate::error::{CacheError, Result};
use crate::peers::{HashFn, HashRing, PeerGetter, PeerPicker};

/// Path prefix under which nodes serve peer requests.
pub const DEFAULT_BASE_PATH: &str = "/_geecache/";

/// Virtual ring positions per peer.
pub const DEFAULT_REPLICAS: usize = 50;

fn normalize_addr(addr: &str) -> String {
    addr.trim_end_matches('/').to_string()
}

// == HTTP Getter ==
/// Fetches values from one remote peer over HTTP.
#[derive(Debug, Clone)]
pub struct HttpGetter {
    base_url: Url,
    client: Client,
}

impl HttpGetter {
    /// Creates a getter for `peer` (e.g. `http://10.0.0.2:8001`) serving under `base_path`.
    pub fn new(peer: &str, base_path: &str, client: Client) -> Result<Self> {
        let base_url = Url::parse(&format!("{}{}", normalize_addr(peer), base_path))
            .map_err(|e| CacheError::Peer(format!("invalid peer address {}: {}", peer, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(CacheError::Peer(format!("invalid peer address {}", peer)));
        }
        Ok(Self { base_url, client })
    }

    /// Builds the request URL; group and key are each encoded as one path segment.
    pub(crate) fn url_for(&self, group: &str, key: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(group).push(key);
        }
        url
    }
}

#[async_trait]
impl PeerGetter for HttpGetter {
    async fn get(&self, group: &str, key: &str) -> Result<Bytes> {
        let url = self.url_for(group, key);
        let response = self.client.get(url).send().await?;

        if response.status() != StatusCode::OK {
            return Err(CacheError::Peer(format!(
                "server returned: {}",
                response.status()
            )));
        }

        Ok(response.bytes().await?)
    }
}

struct PoolState {
    ring: HashRing,
    getters: HashMap<String, Arc<HttpGetter>>,
}

// == HTTP Pool ==
/// Tracks cluster membership and picks the owning peer for a key.
///
/// Membership changes rebuild the ring from scratch under a write lock;
/// routing only takes a read lock.
pub struct HttpPool {
    /// This node's own address, never returned as a peer
    self_addr: String,
    base_path: String,
    replicas: usize,
    hash: Option<HashFn>,
    client: Client,
    state: RwLock<PoolState>,
}

impl HttpPool {
    // == Constructor ==
    /// Creates a pool for the node reachable at `self_addr`.
    pub fn new(self_addr: impl AsRef<str>) -> Self {
        Self {
            self_addr: normalize_addr(self_addr.as_ref()),
            base_path: DEFAULT_BASE_PATH.to_string(),
            replicas: DEFAULT_REPLICAS,
            hash: None,
            client: Client::new(),
            state: RwLock::new(PoolState {
                ring: HashRing::new(DEFAULT_REPLICAS, None),
                getters: HashMap::new(),
            }),
        }
    }

    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = base_path.into();
        self
    }

    pub fn with_replicas(mut self, replicas: usize) -> Self {
        self.replicas = replicas;
        self.state.get_mut().ring = HashRing::new(replicas, self.hash);
        self
    }

    pub fn with_hash(mut self, hash: HashFn) -> Self {
        self.hash = Some(hash);
        self.state.get_mut().ring = HashRing::new(self.replicas, self.hash);
        self
    }

    pub fn self_addr(&self) -> &str {
        &self.self_addr
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    // == Set Peers ==
    /// Replaces the cluster membership. Addresses that cannot be parsed are skipped.
    pub fn set_peers<I, S>(&self, peers: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut ring = HashRing::new(self.replicas, self.hash);
        let mut getters = HashMap::new();

        for peer in peers {
            let peer = normalize_addr(peer.as_ref());
            match HttpGetter::new(&peer, &self.base_path, self.client.clone()) {
                Ok(getter) => {
                    ring.register([peer.as_str()]);
                    getters.insert(peer, Arc::new(getter));
                }
                Err(e) => warn!(server = %self.self_addr, "Skipping peer: {}", e),
            }
        }

        info!(
            server = %self.self_addr,
            "Peer set updated: {} peers, {} ring positions",
            getters.len(),
            ring.len()
        );
        *self.state.write() = PoolState { ring, getters };
    }

    // == Remove Peer ==
    /// Drops one peer from the membership. Returns false if it was unknown.
    pub fn remove_peer(&self, peer: &str) -> bool {
        let peer = normalize_addr(peer);
        let mut state = self.state.write();
        let removed = state.ring.remove(&peer);
        state.getters.remove(&peer);
        if removed {
            info!(server = %self.self_addr, "Peer {} removed", peer);
        }
        removed
    }

    /// Current members in sorted order.
    pub fn peers(&self) -> Vec<String> {
        self.state.read().ring.peers().map(str::to_string).collect()
    }

    /// The ring owner of `key`, which may be this node.
    pub fn owner_of(&self, key: &str) -> Option<String> {
        self.state.read().ring.route(key).map(str::to_string)
    }
}

impl PeerPicker for HttpPool {
    fn pick_peer(&self, key: &str) -> Option<Arc<dyn PeerGetter>> {
        let state = self.state.read();
        let peer = state.ring.route(key)?;
        if peer == self.self_addr {
            return None;
        }

        debug!(server = %self.self_addr, "Pick peer {} for key {}", peer, key);
        let getter = state.getters.get(peer)?;
        Some(Arc::clone(getter) as Arc<dyn PeerGetter>)
    }
}

impl std::fmt::Debug for HttpPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpPool")
            .field("self_addr", &self.self_addr)
            .field("base_path", &self.base_path)
            .field("replicas", &self.replicas)
            .field("peers", &self.peers())
            .finish()
    }
}
