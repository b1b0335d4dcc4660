//! Cache Statistics Module
//!
//! Tracks per-group counters: hits, peer loads, local loads and evictions.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Group Stats ==
/// Lock-free counters updated on the hot path of `Group::get`.
#[derive(Debug, Default)]
pub struct GroupStats {
    gets: AtomicU64,
    hits: AtomicU64,
    peer_loads: AtomicU64,
    peer_errors: AtomicU64,
    local_loads: AtomicU64,
    local_load_errors: AtomicU64,
    evictions: AtomicU64,
}

impl GroupStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_get(&self) {
        self.gets.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_peer_load(&self) {
        self.peer_loads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_peer_error(&self) {
        self.peer_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_local_load(&self) {
        self.local_loads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_local_load_error(&self) {
        self.local_load_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    // == Snapshot ==
    /// Copies the counters into a serializable snapshot.
    pub fn snapshot(&self, total_entries: usize, used_bytes: usize) -> CacheStats {
        let gets = self.gets.load(Ordering::Relaxed);
        let hits = self.hits.load(Ordering::Relaxed);
        CacheStats {
            gets,
            hits,
            misses: gets.saturating_sub(hits),
            peer_loads: self.peer_loads.load(Ordering::Relaxed),
            peer_errors: self.peer_errors.load(Ordering::Relaxed),
            local_loads: self.local_loads.load(Ordering::Relaxed),
            local_load_errors: self.local_load_errors.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            total_entries,
            used_bytes,
        }
    }
}

// == Cache Stats ==
/// Point-in-time view of a group's counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Non-empty keys requested through `Group::get`
    pub gets: u64,
    /// Requests answered from the local cache
    pub hits: u64,
    /// Requests that went to a peer or the loader
    pub misses: u64,
    /// Values fetched successfully from a peer
    pub peer_loads: u64,
    /// Peer fetches that failed and fell back to the loader
    pub peer_errors: u64,
    /// Values produced by the loader
    pub local_loads: u64,
    /// Loader failures returned to the caller
    pub local_load_errors: u64,
    /// Entries evicted due to the byte budget
    pub evictions: u64,
    /// Current number of entries in the local cache
    pub total_entries: usize,
    /// Bytes currently charged against the budget
    pub used_bytes: usize,
}

impl CacheStats {
    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / gets, or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        if self.gets == 0 {
            0.0
        } else {
            self.hits as f64 / self.gets as f64
        }
    }
}
