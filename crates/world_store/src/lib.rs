//! # world_store
//!
//! The shared stores of the world runtime — the component table, the
//! resource table, and the event queue — behind a cloneable [`StoreHandle`].
//!
//! All three stores are concurrently readable from any task. Writes to the
//! component and resource tables are made correct by the schedule (the
//! batching plan keeps writers of the same data out of the same parallel
//! batch), not by per-key locking. The event queue is append-only within a
//! frame and drained by the frame driver at frame boundaries.
//!
//! Payloads are dynamically typed [`serde_json::Value`]s keyed by component
//! and resource names; no schema is enforced at this layer.

pub mod event;
pub mod store;

pub use event::{EventKey, EventRecord, batch_events};
pub use store::StoreHandle;
