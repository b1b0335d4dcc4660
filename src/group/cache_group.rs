//! Cache Group
//!
//! A named cache namespace that answers a key from local memory, from the
//! peer owning the key, or from the caller's loader, in that order.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::cache::{ByteView, CacheStats, GroupStats, MainCache};
use crate::error::{CacheError, Result};
use crate::peers::{PeerGetter, PeerPicker};

/// Deadline applied to every peer fetch.
pub const DEFAULT_PEER_TIMEOUT: Duration = Duration::from_secs(3);

// == Getter ==
/// Produces the authoritative value for a key on a cache miss.
#[async_trait]
pub trait Getter: Send + Sync {
    async fn get(&self, key: &str) -> anyhow::Result<Vec<u8>>;
}

/// Adapts a plain closure into a [`Getter`].
pub struct GetterFn<F>(pub F);

#[async_trait]
impl<F> Getter for GetterFn<F>
where
    F: Fn(&str) -> anyhow::Result<Vec<u8>> + Send + Sync,
{
    async fn get(&self, key: &str) -> anyhow::Result<Vec<u8>> {
        (self.0)(key)
    }
}

// == Group ==
pub struct Group {
    name: String,
    getter: Arc<dyn Getter>,
    main_cache: MainCache,
    peers: OnceLock<Arc<dyn PeerPicker>>,
    peer_timeout: Duration,
    stats: Arc<GroupStats>,
}

impl Group {
    // == Constructor ==
    /// Creates a group whose local cache holds at most `cache_bytes` bytes
    /// of keys and values (0 = unbounded).
    pub fn new(name: impl Into<String>, cache_bytes: usize, getter: Arc<dyn Getter>) -> Self {
        let stats = Arc::new(GroupStats::new());
        let eviction_stats = Arc::clone(&stats);
        let main_cache = MainCache::new(cache_bytes).with_eviction_callback(Arc::new(
            move |_key: &str, _value: &ByteView| eviction_stats.record_eviction(),
        ));

        Self {
            name: name.into(),
            getter,
            main_cache,
            peers: OnceLock::new(),
            peer_timeout: DEFAULT_PEER_TIMEOUT,
            stats,
        }
    }

    pub fn with_peer_timeout(mut self, timeout: Duration) -> Self {
        self.peer_timeout = timeout;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cache_bytes(&self) -> usize {
        self.main_cache.cache_bytes()
    }

    pub fn peer_timeout(&self) -> Duration {
        self.peer_timeout
    }

    // == Register Peers ==
    /// Wires in the peer picker.
    ///
    /// # Panics
    /// If called more than once on the same group.
    pub fn register_peers(&self, peers: Arc<dyn PeerPicker>) {
        if self.peers.set(peers).is_err() {
            panic!("register_peers called more than once");
        }
    }

    // == Get ==
    /// Returns the value for `key`, loading it on a miss.
    ///
    /// Only validation and loader errors reach the caller; peer failures
    /// fall back to the loader.
    pub async fn get(&self, key: &str) -> Result<ByteView> {
        if key.is_empty() {
            return Err(CacheError::KeyRequired);
        }

        self.stats.record_get();
        if let Some(value) = self.main_cache.get(key) {
            self.stats.record_hit();
            debug!(group = %self.name, "Cache hit for key {}", key);
            return Ok(value);
        }

        self.load(key).await
    }

    // == Peek ==
    /// Looks only at the local cache, without loading or touching recency.
    pub fn peek(&self, key: &str) -> Option<ByteView> {
        self.main_cache.peek(key)
    }

    // == Stats ==
    pub fn stats(&self) -> CacheStats {
        self.stats
            .snapshot(self.main_cache.len(), self.main_cache.used_bytes())
    }

    async fn load(&self, key: &str) -> Result<ByteView> {
        if let Some(peer) = self.peers.get().and_then(|picker| picker.pick_peer(key)) {
            match self.get_from_peer(peer.as_ref(), key).await {
                Ok(value) => {
                    self.stats.record_peer_load();
                    return Ok(value);
                }
                Err(e) => {
                    self.stats.record_peer_error();
                    warn!(group = %self.name, "Failed to get {} from peer: {}", key, e);
                }
            }
        }

        self.get_locally(key).await
    }

    /// Peer values are returned as-is; the owning peer is their cache.
    async fn get_from_peer(&self, peer: &dyn PeerGetter, key: &str) -> Result<ByteView> {
        let bytes = tokio::time::timeout(self.peer_timeout, peer.get(&self.name, key))
            .await
            .map_err(|_| CacheError::PeerTimeout(self.peer_timeout))??;
        Ok(ByteView::from(bytes))
    }

    async fn get_locally(&self, key: &str) -> Result<ByteView> {
        let bytes = match self.getter.get(key).await {
            Ok(bytes) => bytes,
            Err(e) => {
                self.stats.record_local_load_error();
                return Err(CacheError::Loader(e));
            }
        };

        self.stats.record_local_load();
        let value = ByteView::from(bytes);
        self.populate_cache(key, value.clone());
        Ok(value)
    }

    fn populate_cache(&self, key: &str, value: ByteView) {
        self.main_cache.add(key, value);
    }
}

impl std::fmt::Debug for Group {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Group")
            .field("name", &self.name)
            .field("main_cache", &self.main_cache)
            .field("has_peers", &self.peers.get().is_some())
            .field("peer_timeout", &self.peer_timeout)
            .finish()
    }
}
