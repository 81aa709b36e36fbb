//! Event records and the frame-boundary event batcher.
//!
//! Events are transient data produced during frame N and consumed during
//! frame N+1. At each frame boundary the driver drains the queue and runs
//! [`batch_events`], which turns the time-ordered records into an ordered
//! list of batches such that no batch contains two events with the same key.

use std::collections::HashSet;
use std::time::Instant;

use serde_json::Value;

use world_component::ComponentTag;

/// The identity of an event within a frame: its type plus a user-supplied
/// discriminator (commonly the affected entity's raw id).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EventKey {
    /// The event type name.
    pub event_type: ComponentTag,
    /// User-supplied discriminator distinguishing concurrent events of the
    /// same type.
    pub id: u64,
}

/// A single pending event.
#[derive(Debug, Clone)]
pub struct EventRecord {
    /// The event's key.
    pub key: EventKey,
    /// The event payload.
    pub payload: Value,
    /// Monotonic insertion timestamp, used to order repeats of a key.
    pub inserted_at: Instant,
}

impl EventRecord {
    /// Build a record stamped with the current instant.
    #[must_use]
    pub fn new(event_type: impl Into<ComponentTag>, id: u64, payload: Value) -> Self {
        Self {
            key: EventKey {
                event_type: event_type.into(),
                id,
            },
            payload,
            inserted_at: Instant::now(),
        }
    }
}

/// Split a drained event queue into ordered parallel batches.
///
/// Records are sorted by insertion instant (stable, so same-instant records
/// keep queue order), then batches are peeled off the front: each batch takes
/// the first remaining occurrence of every distinct key, so repeats of a key
/// land in successive batches in insertion order while distinct keys share a
/// batch.
///
/// Applying the function to a queue with at most one record per key yields a
/// single batch.
#[must_use]
pub fn batch_events(mut records: Vec<EventRecord>) -> Vec<Vec<EventRecord>> {
    records.sort_by_key(|r| r.inserted_at);

    let mut batches = Vec::new();
    while !records.is_empty() {
        let mut seen: HashSet<EventKey> = HashSet::new();
        let mut batch = Vec::new();
        let mut rest = Vec::new();

        for record in records {
            if seen.insert(record.key.clone()) {
                batch.push(record);
            } else {
                rest.push(record);
            }
        }

        batches.push(batch);
        records = rest;
    }

    batches
}
