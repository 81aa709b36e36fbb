//! # world_component
//!
//! The identity layer of the world runtime — defines what an entity is, how
//! components and systems are named, and the component-lock grammar the
//! scheduler uses to keep parallel systems from writing the same data.
//!
//! This crate provides:
//!
//! - [`Entity`] — lightweight `u64` entity identifiers.
//! - [`EntityAllocator`] — monotonically increasing ID allocator.
//! - [`ComponentTag`] / [`SystemTag`] — string names for component types and
//!   systems in the dynamically-typed store.
//! - [`LockEntry`] / [`LockSet`] — static per-system write-lock declarations
//!   and the pure conflict predicate over them.

pub mod entity;
pub mod lock;
pub mod tag;

pub use entity::{Entity, EntityAllocator};
pub use lock::{LockEntry, LockSet};
pub use tag::{ComponentTag, SystemTag};
