//! Schedule builder — the operations exposed to the user's setup callback.
//!
//! The builder accumulates add operations (validating each eagerly), tracks
//! the active system-set option stack, and finalizes into an immutable
//! [`Schedule`]: per-phase system lists in insertion order plus the batched
//! parallel plan for the async phase.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use world_component::SystemTag;
use world_store::StoreHandle;

use crate::condition::{Condition, ConditionKey};
use crate::error::ScheduleError;
use crate::options::SystemOptions;
use crate::plan::{self, BatchPlan};
use crate::registry::SystemRegistry;
use crate::system::{FrameContext, Phase, System, SystemSpec};

/// Tag of the internal startup system appended at finalization.
pub const DEFAULT_RESOURCES_TAG: &str = "init_default_resources";

/// One accumulated, already-validated add operation.
struct AddOp {
    phase: Phase,
    tag: SystemTag,
    options: SystemOptions,
    system: Arc<dyn System>,
}

impl std::fmt::Debug for AddOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AddOp")
            .field("phase", &self.phase)
            .field("tag", &self.tag)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// An active system set's contribution to the option stack.
#[derive(Debug)]
struct SetFrame {
    id: u64,
    options: SystemOptions,
}

/// Accumulates schedule operations declared by the user's setup callback.
///
/// Operations are consuming and fallible: each takes the current builder and
/// returns the updated one, or a [`ScheduleError`] that surfaces
/// synchronously to the setup caller.
#[derive(Debug)]
pub struct ScheduleBuilder {
    registry: SystemRegistry,
    default_resources: Vec<(String, Value)>,
    ops: Vec<AddOp>,
    /// Every tag added so far, across all phases.
    tags: HashSet<SystemTag>,
    /// Tags of async systems added so far, for `run_after` resolution.
    async_tags: HashSet<SystemTag>,
    set_stack: Vec<SetFrame>,
    next_set_id: u64,
}

impl ScheduleBuilder {
    /// Create a builder drawing implementations from the given registry.
    ///
    /// `default_resources` seeds the resource table via the internal startup
    /// system appended at finalization.
    #[must_use]
    pub fn new(registry: SystemRegistry, default_resources: Vec<(String, Value)>) -> Self {
        Self {
            registry,
            default_resources,
            ops: Vec::new(),
            tags: HashSet::new(),
            async_tags: HashSet::new(),
            set_stack: Vec::new(),
            next_set_id: 1,
        }
    }

    /// Add a system to the startup phase. Startup systems run once, in
    /// insertion order, before the first frame; they accept no options, so
    /// conditional startup systems cannot be expressed.
    pub fn add_startup_system(self, tag: impl Into<SystemTag>) -> Result<Self, ScheduleError> {
        self.add(Phase::Startup, tag.into(), SystemOptions::new())
    }

    /// Add a system to the frame-start phase (serialized, insertion order).
    pub fn add_frame_start_system(
        self,
        tag: impl Into<SystemTag>,
        options: SystemOptions,
    ) -> Result<Self, ScheduleError> {
        self.add(Phase::FrameStart, tag.into(), options)
    }

    /// Add a system to the async phase — the only phase that parallelizes.
    pub fn add_system(
        self,
        tag: impl Into<SystemTag>,
        options: SystemOptions,
    ) -> Result<Self, ScheduleError> {
        self.add(Phase::Async, tag.into(), options)
    }

    /// Add a system to the frame-end phase (serialized, insertion order).
    pub fn add_frame_end_system(
        self,
        tag: impl Into<SystemTag>,
        options: SystemOptions,
    ) -> Result<Self, ScheduleError> {
        self.add(Phase::FrameEnd, tag.into(), options)
    }

    /// Add a system to the shutdown phase. Shutdown systems run once, in
    /// insertion order, when the world terminates; they are gate-less.
    pub fn add_shutdown_system(self, tag: impl Into<SystemTag>) -> Result<Self, ScheduleError> {
        self.add(Phase::Shutdown, tag.into(), SystemOptions::new())
    }

    /// Run a grouping function whose adds all inherit the set's options.
    ///
    /// Sets nest: inner sets see the options of every enclosing set, merged
    /// per key (union, flattened, de-duplicated). On return, the set's
    /// contribution is removed from the option stack.
    pub fn add_system_set<F>(mut self, options: SystemOptions, f: F) -> Result<Self, ScheduleError>
    where
        F: FnOnce(ScheduleBuilder) -> Result<ScheduleBuilder, ScheduleError>,
    {
        let id = self.next_set_id;
        self.next_set_id += 1;
        self.set_stack.push(SetFrame { id, options });

        let mut builder = f(self)?;

        if let Some(pos) = builder.set_stack.iter().rposition(|frame| frame.id == id) {
            builder.set_stack.truncate(pos);
        }
        Ok(builder)
    }

    fn add(
        mut self,
        phase: Phase,
        tag: SystemTag,
        options: SystemOptions,
    ) -> Result<Self, ScheduleError> {
        let Some(system) = self.registry.get(&tag) else {
            return Err(ScheduleError::NotASystem(tag));
        };
        if self.tags.contains(&tag) {
            return Err(ScheduleError::DuplicateSystem(tag));
        }

        let mut merged = SystemOptions::new();
        match phase {
            Phase::Startup | Phase::Shutdown => {
                // Startup and shutdown systems are unconditional; active set
                // options must not silently attach gating to them.
                if self.set_stack.iter().any(|f| !f.options.is_empty()) {
                    warn!(
                        system = %tag,
                        phase = %phase,
                        "set options do not apply to startup/shutdown systems"
                    );
                }
            }
            _ => {
                for frame in &self.set_stack {
                    merged.merge(&frame.options);
                }
                merged.merge(&options);
            }
        }

        if !phase.is_async() && !merged.run_after.is_empty() {
            warn!(
                system = %tag,
                phase = %phase,
                "run_after is ignored outside the async phase; insertion order applies"
            );
            merged.run_after.clear();
        }

        if phase.is_async() {
            for predecessor in &merged.run_after {
                if !self.async_tags.contains(predecessor) {
                    return Err(ScheduleError::UnknownPredecessor {
                        system: tag,
                        predecessor: predecessor.clone(),
                    });
                }
            }
            self.async_tags.insert(tag.clone());
        }

        debug!(system = %tag, phase = %phase, "adding system to schedule");
        self.tags.insert(tag.clone());
        self.ops.push(AddOp {
            phase,
            tag,
            options: merged,
            system,
        });
        Ok(self)
    }

    /// Finalize the schedule.
    ///
    /// Appends the internal default-resources startup system, then replays
    /// the accumulated operations in insertion order: sync phases keep
    /// insertion order, async systems run through the batching analyzer.
    pub fn finish(mut self) -> Result<Schedule, ScheduleError> {
        let tag = SystemTag::from(DEFAULT_RESOURCES_TAG);
        if self.tags.contains(&tag) {
            return Err(ScheduleError::DuplicateSystem(tag));
        }
        let resources = std::mem::take(&mut self.default_resources);
        self.ops.push(AddOp {
            phase: Phase::Startup,
            tag,
            options: SystemOptions::new(),
            system: Arc::new(InitDefaultResources { resources }),
        });

        let mut startup = Vec::new();
        let mut frame_start = Vec::new();
        let mut async_plan = BatchPlan::new();
        let mut frame_end = Vec::new();
        let mut shutdown = Vec::new();

        for op in self.ops {
            let AddOp {
                phase,
                tag,
                options,
                system,
            } = op;
            let spec = Arc::new(SystemSpec {
                tag,
                phase,
                run_after: options.run_after.clone(),
                conditions: options.conditions(),
                locks: system.locked_components(),
                system,
            });
            match phase {
                Phase::Startup => startup.push(spec),
                Phase::FrameStart => frame_start.push(spec),
                Phase::Async => plan::place(&mut async_plan, spec)?,
                Phase::FrameEnd => frame_end.push(spec),
                Phase::Shutdown => shutdown.push(spec),
            }
        }

        // Collect every distinct run condition for the once-per-frame refresh.
        let mut conditions: Vec<Condition> = Vec::new();
        let mut seen: HashSet<ConditionKey> = HashSet::new();
        for spec in frame_start
            .iter()
            .chain(async_plan.iter().flatten())
            .chain(frame_end.iter())
        {
            for cond in &spec.conditions {
                if seen.insert(cond.key()) {
                    conditions.push(cond.clone());
                }
            }
        }

        info!(
            startup = startup.len(),
            frame_start = frame_start.len(),
            async_batches = async_plan.len(),
            frame_end = frame_end.len(),
            shutdown = shutdown.len(),
            conditions = conditions.len(),
            "schedule finalized"
        );

        Ok(Schedule {
            startup,
            frame_start,
            async_plan,
            frame_end,
            shutdown,
            conditions,
        })
    }
}

/// An immutable, finalized schedule: five per-phase system lists plus the
/// batched parallel plan for the async phase.
#[derive(Debug)]
pub struct Schedule {
    startup: Vec<Arc<SystemSpec>>,
    frame_start: Vec<Arc<SystemSpec>>,
    async_plan: BatchPlan,
    frame_end: Vec<Arc<SystemSpec>>,
    shutdown: Vec<Arc<SystemSpec>>,
    conditions: Vec<Condition>,
}

impl Schedule {
    /// Startup systems in insertion order.
    #[must_use]
    pub fn startup(&self) -> &[Arc<SystemSpec>] {
        &self.startup
    }

    /// Frame-start systems in insertion order.
    #[must_use]
    pub fn frame_start(&self) -> &[Arc<SystemSpec>] {
        &self.frame_start
    }

    /// The async phase's ordered parallel batches.
    #[must_use]
    pub fn async_batches(&self) -> &BatchPlan {
        &self.async_plan
    }

    /// Frame-end systems in insertion order.
    #[must_use]
    pub fn frame_end(&self) -> &[Arc<SystemSpec>] {
        &self.frame_end
    }

    /// Shutdown systems in insertion order.
    #[must_use]
    pub fn shutdown(&self) -> &[Arc<SystemSpec>] {
        &self.shutdown
    }

    /// Every distinct run condition in the schedule, for the once-per-frame
    /// cache refresh.
    #[must_use]
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Total number of systems across all phases.
    #[must_use]
    pub fn system_count(&self) -> usize {
        self.startup.len()
            + self.frame_start.len()
            + self.async_plan.iter().map(Vec::len).sum::<usize>()
            + self.frame_end.len()
            + self.shutdown.len()
    }
}

/// Internal startup system seeding the resource table with the world's
/// configured defaults. Appended at finalization; seeds only resources no
/// earlier startup system has set.
struct InitDefaultResources {
    resources: Vec<(String, Value)>,
}

impl System for InitDefaultResources {
    fn tag(&self) -> SystemTag {
        SystemTag::from(DEFAULT_RESOURCES_TAG)
    }

    fn run(&self, _ctx: &FrameContext, store: &StoreHandle) -> anyhow::Result<()> {
        for (name, value) in &self.resources {
            if store.resource(name).is_none() {
                store.set_resource(name.clone(), value.clone());
            }
        }
        Ok(())
    }
}
