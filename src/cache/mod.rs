//! Cache Module
//!
//! Provides the byte-bounded LRU store, its thread-safe wrapper and the
//! immutable value type handed out to callers.

mod byteview;
mod lru;
mod stats;
mod store;


// Re-export public types
pub use byteview::ByteView;
pub use lru::{EvictionCallback, LruCache, Value};
pub use stats::{CacheStats, GroupStats};
pub use store::MainCache;
