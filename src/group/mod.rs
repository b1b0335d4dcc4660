//! Group Module
//!
//! Named cache namespaces and the registry that owns them.

mod cache_group;
mod registry;

pub use cache_group::{Getter, GetterFn, Group, DEFAULT_PEER_TIMEOUT};
pub use registry::GroupRegistry;
