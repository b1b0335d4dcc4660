//! Mini Groupcache - A distributed read-through cache
//!
//! Named cache groups answer keys from a byte-bounded LRU, from the peer
//! that owns the key on a consistent-hash ring, or from a loader.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod group;
pub mod models;
pub mod peers;

pub use api::AppState;
pub use cache::ByteView;
pub use config::Config;
pub use error::{CacheError, Result};
pub use group::{Getter, GetterFn, Group, GroupRegistry};
pub use peers::{HttpPool, PeerGetter, PeerPicker};
