//! Component, resource, and event storage.
//!
//! Components are stored as dynamically-typed values keyed by
//! `(Entity, ComponentTag)`; resources are singletons keyed by name. The
//! world state value read by state-based run conditions lives in the
//! resource table under [`WORLD_STATE_KEY`].

use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use parking_lot::Mutex;
use serde_json::Value;

use world_component::{ComponentTag, Entity, EntityAllocator};

use crate::event::{EventKey, EventRecord};

/// Reserved resource key holding the current world state value.
pub const WORLD_STATE_KEY: &str = "world_state";

/// The backing tables of a world.
#[derive(Debug, Default)]
struct Stores {
    /// Entity ID allocation for this world.
    entities: EntityAllocator,
    /// Component payloads keyed by `(entity, component type)`.
    components: DashMap<(Entity, ComponentTag), Value>,
    /// Global singleton resources keyed by name.
    resources: DashMap<String, Value>,
    /// Pending events, appended by systems during a frame and drained by the
    /// driver at frame boundaries. Duplicate keys are allowed.
    events: Mutex<Vec<EventRecord>>,
}

/// A cloneable handle to the shared stores.
///
/// Every system task receives a clone; the tables live as long as any handle
/// does and are destroyed with the world.
#[derive(Debug, Clone, Default)]
pub struct StoreHandle {
    inner: Arc<Stores>,
}

impl StoreHandle {
    /// Create a fresh, empty set of stores.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh entity ID, unique for this world.
    #[must_use]
    pub fn spawn_entity(&self) -> Entity {
        self.inner.entities.allocate()
    }

    // -- Component operations --

    /// Get a component value from an entity.
    #[must_use]
    pub fn get(&self, entity: Entity, component: &ComponentTag) -> Option<Value> {
        self.inner
            .components
            .get(&(entity, component.clone()))
            .map(|v| v.value().clone())
    }

    /// Set a component on an entity.
    ///
    /// The caller must hold a schedule-level lock on the component type;
    /// the store does not enforce this.
    pub fn set(&self, entity: Entity, component: impl Into<ComponentTag>, value: Value) {
        self.inner.components.insert((entity, component.into()), value);
    }

    /// Remove a component from an entity. Returns the removed value, if any.
    pub fn delete(&self, entity: Entity, component: &ComponentTag) -> Option<Value> {
        self.inner
            .components
            .remove(&(entity, component.clone()))
            .map(|(_, v)| v)
    }

    /// Check if an entity has a specific component.
    #[must_use]
    pub fn has(&self, entity: Entity, component: &ComponentTag) -> bool {
        self.inner.components.contains_key(&(entity, component.clone()))
    }

    /// Return all entities currently carrying a component type.
    #[must_use]
    pub fn entities_with(&self, component: &ComponentTag) -> Vec<Entity> {
        let mut out: Vec<Entity> = self
            .inner
            .components
            .iter()
            .filter(|kv| &kv.key().1 == component)
            .map(|kv| kv.key().0)
            .collect();
        out.sort();
        out
    }

    // -- Resource operations --

    /// Get a resource value by name.
    #[must_use]
    pub fn resource(&self, name: &str) -> Option<Value> {
        self.inner.resources.get(name).map(|v| v.value().clone())
    }

    /// Set a resource value.
    pub fn set_resource(&self, name: impl Into<String>, value: Value) {
        self.inner.resources.insert(name.into(), value);
    }

    /// Remove a resource. Returns the removed value, if any.
    pub fn delete_resource(&self, name: &str) -> Option<Value> {
        self.inner.resources.remove(name).map(|(_, v)| v)
    }

    /// Read the current world state value, if one has been set.
    #[must_use]
    pub fn state(&self) -> Option<Value> {
        self.resource(WORLD_STATE_KEY)
    }

    /// Set the world state value read by state-based run conditions.
    pub fn set_state(&self, value: Value) {
        self.set_resource(WORLD_STATE_KEY, value);
    }

    // -- Event operations --

    /// Append an event to the queue.
    ///
    /// Events inserted during frame N become observable in frame N+1. The
    /// same key may be inserted any number of times; the batcher spreads
    /// repeats across successive batches in insertion order.
    pub fn insert_event(&self, event_type: impl Into<ComponentTag>, id: u64, payload: Value) {
        let record = EventRecord {
            key: EventKey {
                event_type: event_type.into(),
                id,
            },
            payload,
            inserted_at: Instant::now(),
        };
        self.inner.events.lock().push(record);
    }

    /// Drain all pending events, clearing the queue.
    ///
    /// Called by the frame driver at each frame boundary; systems should not
    /// call this.
    pub fn drain_events(&self) -> Vec<EventRecord> {
        std::mem::take(&mut *self.inner.events.lock())
    }

    /// Returns the number of pending events.
    #[must_use]
    pub fn pending_events(&self) -> usize {
        self.inner.events.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_component_set_get_delete() {
        let store = StoreHandle::new();
        let e = Entity::from_raw(1);
        let pos = ComponentTag::from("position");

        store.set(e, pos.clone(), json!({"x": 1.0, "y": 2.0}));
        assert!(store.has(e, &pos));
        assert_eq!(store.get(e, &pos).unwrap()["x"], 1.0);

        let removed = store.delete(e, &pos).unwrap();
        assert_eq!(removed["y"], 2.0);
        assert!(!store.has(e, &pos));
        assert!(store.get(e, &pos).is_none());
    }

    #[test]
    fn test_entities_with() {
        let store = StoreHandle::new();
        let hp = ComponentTag::from("hp");
        store.set(Entity::from_raw(3), hp.clone(), json!(10));
        store.set(Entity::from_raw(1), hp.clone(), json!(20));
        store.set(Entity::from_raw(2), ComponentTag::from("mp"), json!(5));

        let entities = store.entities_with(&hp);
        assert_eq!(entities, vec![Entity::from_raw(1), Entity::from_raw(3)]);
    }

    #[test]
    fn test_resources() {
        let store = StoreHandle::new();
        assert!(store.resource("score").is_none());
        store.set_resource("score", json!(100));
        assert_eq!(store.resource("score").unwrap(), json!(100));
        assert_eq!(store.delete_resource("score").unwrap(), json!(100));
        assert!(store.resource("score").is_none());
    }

    #[test]
    fn test_world_state_resource() {
        let store = StoreHandle::new();
        assert!(store.state().is_none());
        store.set_state(json!("playing"));
        assert_eq!(store.state().unwrap(), json!("playing"));
        assert_eq!(store.resource(WORLD_STATE_KEY).unwrap(), json!("playing"));
    }

    #[test]
    fn test_event_queue_drains_and_clears() {
        let store = StoreHandle::new();
        store.insert_event("collision", 1, json!({"damage": 5}));
        store.insert_event("collision", 1, json!({"damage": 7}));
        assert_eq!(store.pending_events(), 2);

        let drained = store.drain_events();
        assert_eq!(drained.len(), 2);
        assert_eq!(store.pending_events(), 0);
        assert!(store.drain_events().is_empty());
    }

    #[test]
    fn test_handles_share_tables() {
        let a = StoreHandle::new();
        let b = a.clone();
        b.set(Entity::from_raw(7), "hp", json!(3));
        assert!(a.has(Entity::from_raw(7), &ComponentTag::from("hp")));
    }

    #[test]
    fn test_spawn_entity_is_shared_and_unique() {
        let a = StoreHandle::new();
        let b = a.clone();
        let e1 = a.spawn_entity();
        let e2 = b.spawn_entity();
        assert!(e1.is_valid());
        assert_ne!(e1, e2);
    }
}
