//! Immutable debug snapshots of the frame state.

use serde::Serialize;

use world_component::SystemTag;

use crate::driver::Status;

/// A point-in-time view of the driver's frame state.
///
/// Returned by the world's debug operation when the debug toggle is enabled;
/// otherwise the operation yields `DebugDisabled`.
#[derive(Debug, Clone, Serialize)]
pub struct FrameSnapshot {
    /// The driver's current phase status.
    pub status: Status,
    /// Frames started so far.
    pub frame: u64,
    /// Milliseconds between the last two frame starts.
    pub delta_ms: u64,
    /// Whether the current frame's timer has elapsed.
    pub timer_finished: bool,
    /// Tags of systems currently in flight.
    pub in_flight: Vec<SystemTag>,
    /// Systems still queued in the current sync phase.
    pub queued_systems: usize,
    /// Async batches not yet dispatched this frame.
    pub queued_batches: usize,
    /// Events waiting in the store for the next frame boundary.
    pub pending_events: usize,
}
