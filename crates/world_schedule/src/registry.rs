//! System registry — the implementations the schedule builder draws from.
//!
//! Schedule operations reference systems by tag; the registry maps each tag
//! to its implementation. A tag that names nothing registered fails the
//! capability check at schedule build.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use world_component::SystemTag;

use crate::system::System;

/// Registry of all system implementations known to a world.
#[derive(Default)]
pub struct SystemRegistry {
    systems: HashMap<SystemTag, Arc<dyn System>>,
}

impl SystemRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a system implementation under its own tag.
    ///
    /// Registering a tag twice replaces the earlier implementation (with a
    /// warning); the schedule builder separately rejects adding a tag twice.
    pub fn register(&mut self, system: Arc<dyn System>) {
        let tag = system.tag();
        debug!(system = %tag, "registering system");
        if self.systems.insert(tag.clone(), system).is_some() {
            warn!(system = %tag, "system registered twice, replacing earlier implementation");
        }
    }

    /// Register a system, builder style.
    #[must_use]
    pub fn with(mut self, system: Arc<dyn System>) -> Self {
        self.register(system);
        self
    }

    /// Look up a system implementation by tag.
    #[must_use]
    pub fn get(&self, tag: &SystemTag) -> Option<Arc<dyn System>> {
        self.systems.get(tag).cloned()
    }

    /// Returns `true` if the tag names a registered system.
    #[must_use]
    pub fn contains(&self, tag: &SystemTag) -> bool {
        self.systems.contains_key(tag)
    }

    /// Returns the number of registered systems.
    #[must_use]
    pub fn len(&self) -> usize {
        self.systems.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    /// Iterate over all registered systems.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn System>> {
        self.systems.values()
    }
}

impl std::fmt::Debug for SystemRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut tags: Vec<&SystemTag> = self.systems.keys().collect();
        tags.sort();
        f.debug_struct("SystemRegistry").field("systems", &tags).finish()
    }
}
