//! # world_schedule
//!
//! Schedule construction for the world runtime.
//!
//! A schedule organizes systems into five phases — startup, frame start,
//! async, frame end, shutdown. Sync phases preserve insertion order; the
//! async phase is analyzed into an ordered list of parallel batches such
//! that no two systems in a batch hold conflicting component locks and every
//! `run_after` constraint places a system strictly after its predecessors.
//!
//! This crate provides:
//!
//! - [`System`] — the capability trait every schedulable system implements.
//! - [`SystemRegistry`] — name-keyed registry of system implementations.
//! - [`ScheduleBuilder`] — the operations exposed to the user's setup
//!   callback, including nested system sets with inherited options.
//! - [`Condition`] / [`SystemOptions`] — per-system run gating.
//! - [`plan`] — the batching analyzer.

pub mod builder;
pub mod condition;
pub mod error;
pub mod options;
pub mod plan;
pub mod registry;
pub mod system;

pub use builder::{Schedule, ScheduleBuilder};
pub use condition::{Condition, ConditionKey};
pub use error::ScheduleError;
pub use options::SystemOptions;
pub use registry::SystemRegistry;
pub use system::{FrameContext, Phase, System, SystemSpec};
