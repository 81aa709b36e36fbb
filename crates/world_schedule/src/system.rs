//! The system capability trait and finalized system descriptors.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use world_component::{ComponentTag, LockSet, SystemTag};
use world_store::{EventRecord, StoreHandle};

use crate::condition::Condition;

/// The phase queue a system belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Runs once when the world starts.
    Startup,
    /// Runs at the start of every frame, serialized in insertion order.
    FrameStart,
    /// Runs every frame in parallel batches.
    Async,
    /// Runs at the end of every frame, serialized in insertion order.
    FrameEnd,
    /// Runs once when the world shuts down.
    Shutdown,
}

impl Phase {
    /// Returns `true` for the one phase that parallelizes.
    #[must_use]
    pub fn is_async(self) -> bool {
        matches!(self, Phase::Async)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Phase::Startup => "startup",
            Phase::FrameStart => "frame_start",
            Phase::Async => "async",
            Phase::FrameEnd => "frame_end",
            Phase::Shutdown => "shutdown",
        };
        f.write_str(name)
    }
}

/// Per-frame data handed to every dispatched system.
#[derive(Debug, Clone, Default)]
pub struct FrameContext {
    /// Milliseconds since the previous frame started (monotonic clock).
    pub delta_ms: u64,
    /// The frame's event batches, drained at the frame boundary.
    pub event_batches: Vec<Vec<EventRecord>>,
}

impl FrameContext {
    /// An empty context (zero delta, no events).
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Iterate over every event of a given type, batch order preserved.
    pub fn events_of<'a>(
        &'a self,
        event_type: &'a ComponentTag,
    ) -> impl Iterator<Item = &'a EventRecord> {
        self.event_batches
            .iter()
            .flatten()
            .filter(move |r| &r.key.event_type == event_type)
    }

    /// Total number of events across all batches.
    #[must_use]
    pub fn event_count(&self) -> usize {
        self.event_batches.iter().map(Vec::len).sum()
    }
}

/// The capability every schedulable system implements.
///
/// A system reads the stores freely and writes only the components it has
/// declared in [`System::locked_components`]; the scheduler keeps systems
/// with conflicting declarations out of the same parallel batch.
pub trait System: Send + Sync {
    /// The system's unique tag.
    fn tag(&self) -> SystemTag;

    /// The component types this system may mutate. Defaults to none
    /// (read-only systems batch with anything).
    fn locked_components(&self) -> LockSet {
        LockSet::new()
    }

    /// Execute one dispatch of the system against the current frame.
    ///
    /// # Errors
    ///
    /// Any error is treated as a fatal world failure.
    fn run(&self, ctx: &FrameContext, store: &StoreHandle) -> anyhow::Result<()>;
}

/// A finalized system descriptor: identity, placement, gating, locks, and
/// the implementation itself. Immutable once the schedule is built.
pub struct SystemSpec {
    /// The system's unique tag.
    pub tag: SystemTag,
    /// The phase queue the system was added to.
    pub phase: Phase,
    /// Systems batched strictly before this one (async phase only).
    pub run_after: Vec<SystemTag>,
    /// The system's run conditions, flattened and de-duplicated.
    pub conditions: Vec<Condition>,
    /// The system's static lock declarations.
    pub locks: LockSet,
    /// The implementation.
    pub system: Arc<dyn System>,
}

impl std::fmt::Debug for SystemSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemSpec")
            .field("tag", &self.tag)
            .field("phase", &self.phase)
            .field("run_after", &self.run_after)
            .field("conditions", &self.conditions)
            .field("locks", &self.locks)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Instant;
    use world_store::EventKey;

    #[test]
    fn test_phase_is_async() {
        assert!(Phase::Async.is_async());
        assert!(!Phase::FrameStart.is_async());
        assert!(!Phase::Shutdown.is_async());
    }

    #[test]
    fn test_frame_context_event_helpers() {
        let hit = ComponentTag::from("hit");
        let spawn = ComponentTag::from("spawn");
        let record = |ty: &ComponentTag, id| EventRecord {
            key: EventKey {
                event_type: ty.clone(),
                id,
            },
            payload: json!(null),
            inserted_at: Instant::now(),
        };

        let ctx = FrameContext {
            delta_ms: 16,
            event_batches: vec![
                vec![record(&hit, 1), record(&spawn, 1)],
                vec![record(&hit, 1)],
            ],
        };

        assert_eq!(ctx.event_count(), 3);
        assert_eq!(ctx.events_of(&hit).count(), 2);
        assert_eq!(ctx.events_of(&spawn).count(), 1);
    }
}
