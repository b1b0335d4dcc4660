//! Consistent Hash Ring
//!
//! Maps keys to peers with virtual replicas so that adding or removing a
//! peer only remaps the keys adjacent to its positions.

use std::collections::{BTreeSet, HashMap};

/// 32-bit hash used to place peers and keys on the ring.
pub type HashFn = fn(&[u8]) -> u32;

// == Hash Ring ==
/// Sorted ring of virtual positions, each owned by one real peer.
#[derive(Clone)]
pub struct HashRing {
    hash: HashFn,
    /// Virtual positions per real peer
    replicas: usize,
    /// Sorted ascending
    ring: Vec<u32>,
    owners: HashMap<u32, String>,
    peers: BTreeSet<String>,
}

impl HashRing {
    // == Constructor ==
    /// Creates an empty ring. Uses CRC-32 (IEEE) when `hash` is `None`.
    pub fn new(replicas: usize, hash: Option<HashFn>) -> Self {
        Self {
            hash: hash.unwrap_or(crc32fast::hash),
            replicas,
            ring: Vec::new(),
            owners: HashMap::new(),
            peers: BTreeSet::new(),
        }
    }

    // == Register ==
    /// Adds peers to the ring. Peers that are already registered are skipped.
    pub fn register<I, S>(&mut self, peers: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for peer in peers {
            let peer = peer.as_ref();
            if !self.peers.insert(peer.to_string()) {
                continue;
            }
            self.place(peer);
        }
        self.ring.sort_unstable();
    }

    // == Remove ==
    /// Removes a peer by rebuilding the ring from the remaining members.
    ///
    /// Returns false if the peer was not registered.
    pub fn remove(&mut self, peer: &str) -> bool {
        if !self.peers.remove(peer) {
            return false;
        }
        self.rebuild();
        true
    }

    // == Route ==
    /// Returns the peer owning `key`: the first position at or after the
    /// key's hash, wrapping around to the start of the ring.
    pub fn route(&self, key: &str) -> Option<&str> {
        if self.ring.is_empty() {
            return None;
        }

        let hash = (self.hash)(key.as_bytes());
        let idx = self.ring.partition_point(|&pos| pos < hash);
        let position = self.ring[idx % self.ring.len()];
        self.owners.get(&position).map(String::as_str)
    }

    /// Number of virtual positions on the ring.
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    pub fn replicas(&self) -> usize {
        self.replicas
    }

    /// Registered peers in sorted order.
    pub fn peers(&self) -> impl Iterator<Item = &str> + '_ {
        self.peers.iter().map(String::as_str)
    }

    pub fn contains(&self, peer: &str) -> bool {
        self.peers.contains(peer)
    }

    fn place(&mut self, peer: &str) {
        for i in 0..self.replicas {
            let position = (self.hash)(format!("{}{}", i, peer).as_bytes());
            self.ring.push(position);
            self.owners.insert(position, peer.to_string());
        }
    }

    fn rebuild(&mut self) {
        self.ring.clear();
        self.owners.clear();
        let peers: Vec<String> = self.peers.iter().cloned().collect();
        for peer in &peers {
            self.place(peer);
        }
        self.ring.sort_unstable();
    }
}

impl std::fmt::Debug for HashRing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HashRing")
            .field("replicas", &self.replicas)
            .field("positions", &self.ring.len())
            .field("peers", &self.peers)
            .finish()
    }
}
