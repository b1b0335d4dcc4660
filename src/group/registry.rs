//! Group Registry
//!
//! Owned name → group mapping shared by everything that serves requests.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;

use crate::group::{Getter, Group};

// == Group Registry ==
/// Maps group names to groups.
///
/// Lookups take a shared lock and never block each other; creation takes
/// the exclusive lock. Dropping the registry drops every group it holds.
#[derive(Default)]
pub struct GroupRegistry {
    groups: RwLock<HashMap<String, Arc<Group>>>,
}

impl GroupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // == Create ==
    /// Creates and registers a group, replacing any group with the same name.
    pub fn create(
        &self,
        name: impl Into<String>,
        cache_bytes: usize,
        getter: Arc<dyn Getter>,
    ) -> Arc<Group> {
        self.insert(Group::new(name, cache_bytes, getter))
    }

    // == Insert ==
    /// Registers an already configured group under its own name.
    pub fn insert(&self, group: Group) -> Arc<Group> {
        let group = Arc::new(group);
        let previous = self
            .groups
            .write()
            .insert(group.name().to_string(), Arc::clone(&group));

        if previous.is_some() {
            info!("Group '{}' replaced", group.name());
        } else {
            info!(
                "Group '{}' created with {} cache bytes",
                group.name(),
                group.cache_bytes()
            );
        }
        group
    }

    // == Get ==
    /// Returns the group registered under `name`.
    pub fn get(&self, name: &str) -> Option<Arc<Group>> {
        self.groups.read().get(name).cloned()
    }

    /// Registered group names in sorted order.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.groups.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.groups.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.read().is_empty()
    }
}

impl std::fmt::Debug for GroupRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroupRegistry")
            .field("groups", &self.names())
            .finish()
    }
}
