//! The frame driver — the state machine at the heart of the world.
//!
//! One driver owns the frame state exclusively and steps it by consuming
//! [`DriverEvent`]s from a channel. Each dispatched system runs as its own
//! task and reports back with a completion event carrying its task id; the
//! driver tracks in-flight tasks in an await-set and only advances the phase
//! when the set drains. A per-frame timer task races system completion: the
//! next frame starts only when both the timer has fired and the frame's
//! phases have drained.
//!
//! ```text
//!         ┌──────────── startup (once) ────────────┐
//!                                                  ▼
//!  ┌─► frame_start ─► async ─► frame_end ─► frame_ended
//!  │                                              │
//!  └────────── timer fired ∧ phases drained ──────┘
//! ```

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};
use uuid::Uuid;

use world_component::SystemTag;
use world_schedule::{FrameContext, Schedule, SystemSpec};
use world_store::{StoreHandle, batch_events};

use crate::conditions::ConditionCache;
use crate::config::{FpsLimit, WorldConfig};
use crate::error::WorldError;
use crate::snapshot::FrameSnapshot;

/// The driver's phase status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Status {
    /// Running startup systems, once.
    Startup,
    /// Running the serialized frame-start systems.
    FrameStart,
    /// Running the async phase's parallel batches.
    Async,
    /// Running the serialized frame-end systems.
    FrameEnd,
    /// All phases drained; waiting on the frame timer.
    FrameEnded,
}

/// Events consumed by the driver's loop.
pub(crate) enum DriverEvent {
    /// A dispatched system finished (or failed).
    Completed {
        task_id: Uuid,
        system: SystemTag,
        result: Result<(), String>,
    },
    /// The frame timer for the given frame elapsed.
    FrameTimerFired { frame: u64 },
    /// Stop the frame loop, run shutdown systems, terminate.
    Shutdown { ack: oneshot::Sender<()> },
    /// Debug snapshot request.
    Snapshot {
        reply: oneshot::Sender<Result<FrameSnapshot, WorldError>>,
    },
}

/// The world's control task state.
pub(crate) struct FrameDriver {
    schedule: Schedule,
    store: StoreHandle,
    fps_limit: FpsLimit,
    max_frames: u64,
    debug: bool,
    initial_events: Vec<world_store::EventRecord>,

    tx: mpsc::Sender<DriverEvent>,
    rx: mpsc::Receiver<DriverEvent>,

    status: Status,
    timer_finished: bool,
    /// Remaining systems of the current sync phase.
    pending: VecDeque<Arc<SystemSpec>>,
    /// Remaining batches of the async phase.
    batches: VecDeque<Vec<Arc<SystemSpec>>>,
    /// In-flight task ids and the systems they run.
    await_set: HashMap<Uuid, SystemTag>,
    cache: ConditionCache,

    frame: u64,
    last_frame: Instant,
    delta_ms: u64,
    frame_data: Arc<FrameContext>,

    finished: bool,
    shutdown_ack: Option<oneshot::Sender<()>>,
}

impl FrameDriver {
    pub(crate) fn new(
        schedule: Schedule,
        store: StoreHandle,
        config: WorldConfig,
        tx: mpsc::Sender<DriverEvent>,
        rx: mpsc::Receiver<DriverEvent>,
    ) -> Self {
        Self {
            schedule,
            store,
            fps_limit: config.fps_limit,
            max_frames: config.max_frames,
            debug: config.debug,
            initial_events: config.initial_events,
            tx,
            rx,
            status: Status::Startup,
            timer_finished: false,
            pending: VecDeque::new(),
            batches: VecDeque::new(),
            await_set: HashMap::new(),
            cache: ConditionCache::new(),
            frame: 0,
            last_frame: Instant::now(),
            delta_ms: 0,
            frame_data: Arc::new(FrameContext::empty()),
            finished: false,
            shutdown_ack: None,
        }
    }

    /// Run the world to termination.
    ///
    /// Returns `Ok` after a clean shutdown (explicit signal or frame
    /// ceiling); any fatal error terminates the world without running
    /// shutdown systems — recovery belongs to the supervisor above.
    pub(crate) async fn run(mut self) -> Result<(), WorldError> {
        info!(
            systems = self.schedule.system_count(),
            max_frames = self.max_frames,
            "world starting"
        );
        self.begin_startup()?;

        while !self.finished {
            let Some(event) = self.rx.recv().await else {
                break;
            };
            self.handle(event)?;
        }

        self.run_shutdown()?;
        if let Some(ack) = self.shutdown_ack.take() {
            let _ = ack.send(());
        }
        info!(frames = self.frame, "world terminated");
        Ok(())
    }

    fn begin_startup(&mut self) -> Result<(), WorldError> {
        self.status = Status::Startup;
        let initial = std::mem::take(&mut self.initial_events);
        self.frame_data = Arc::new(FrameContext {
            delta_ms: 0,
            event_batches: batch_events(initial),
        });
        self.pending = self.schedule.startup().to_vec().into();
        self.advance()
    }

    fn handle(&mut self, event: DriverEvent) -> Result<(), WorldError> {
        match event {
            DriverEvent::Completed {
                task_id,
                system,
                result,
            } => {
                if self.await_set.remove(&task_id).is_none() {
                    return Err(WorldError::UnexpectedCompletion { task_id });
                }
                if let Err(message) = result {
                    return Err(WorldError::SystemCrash { system, message });
                }
                debug!(system = %system, %task_id, "system completed");
                if self.await_set.is_empty() {
                    self.advance()?;
                }
            }
            DriverEvent::FrameTimerFired { frame } => {
                // A timer from an earlier frame is stale; only the current
                // frame's timer gates the boundary.
                if frame == self.frame {
                    self.timer_finished = true;
                    if self.status == Status::FrameEnded {
                        self.advance()?;
                    }
                }
            }
            DriverEvent::Shutdown { ack } => {
                self.finished = true;
                self.shutdown_ack = Some(ack);
            }
            DriverEvent::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
        }
        Ok(())
    }

    /// Drive the current phase forward until a system is in flight, the
    /// frame waits on its timer, or the world is done.
    fn advance(&mut self) -> Result<(), WorldError> {
        loop {
            match self.status {
                Status::Startup | Status::FrameStart | Status::FrameEnd => {
                    while let Some(spec) = self.pending.pop_front() {
                        // Startup systems are unconditional and bypass the cache.
                        if self.status == Status::Startup || self.cache.passes(&spec.conditions) {
                            self.dispatch(spec);
                            return Ok(());
                        }
                        debug!(system = %spec.tag, "skipped by run conditions");
                    }
                    match self.status {
                        Status::Startup => {
                            info!("startup complete");
                            self.start_frame()?;
                        }
                        Status::FrameStart => {
                            self.status = Status::Async;
                            self.batches = self.schedule.async_batches().clone().into();
                        }
                        Status::FrameEnd => self.end_frame(),
                        _ => unreachable!(),
                    }
                }
                Status::Async => {
                    while let Some(batch) = self.batches.pop_front() {
                        let mut dispatched = 0;
                        for spec in batch {
                            if self.cache.passes(&spec.conditions) {
                                self.dispatch(spec);
                                dispatched += 1;
                            } else {
                                debug!(system = %spec.tag, "skipped by run conditions");
                            }
                        }
                        if dispatched > 0 {
                            return Ok(());
                        }
                    }
                    self.status = Status::FrameEnd;
                    self.pending = self.schedule.frame_end().to_vec().into();
                }
                Status::FrameEnded => {
                    if !self.timer_finished {
                        return Ok(());
                    }
                    if self.max_frames > 0 && self.frame >= self.max_frames {
                        info!(frames = self.frame, "frame ceiling reached");
                        self.finished = true;
                        return Ok(());
                    }
                    self.start_frame()?;
                }
            }
        }
    }

    fn start_frame(&mut self) -> Result<(), WorldError> {
        let now = Instant::now();
        self.delta_ms = now.duration_since(self.last_frame).as_millis() as u64;
        self.last_frame = now;
        self.frame += 1;

        let event_batches = batch_events(self.store.drain_events());
        self.frame_data = Arc::new(FrameContext {
            delta_ms: self.delta_ms,
            event_batches,
        });

        self.cache.refresh(self.schedule.conditions(), &self.store)?;

        self.status = Status::FrameStart;
        self.timer_finished = false;
        self.pending = self.schedule.frame_start().to_vec().into();

        let budget = self.fps_limit.frame_budget();
        let tx = self.tx.clone();
        let frame = self.frame;
        tokio::spawn(async move {
            if !budget.is_zero() {
                tokio::time::sleep(budget).await;
            }
            let _ = tx.send(DriverEvent::FrameTimerFired { frame }).await;
        });

        debug!(
            frame = self.frame,
            delta_ms = self.delta_ms,
            event_batches = self.frame_data.event_batches.len(),
            "frame start"
        );
        Ok(())
    }

    fn end_frame(&mut self) {
        self.status = Status::FrameEnded;

        let elapsed = self.last_frame.elapsed();
        let budget = self.fps_limit.frame_budget();
        if !budget.is_zero() && elapsed > budget {
            warn!(
                frame = self.frame,
                elapsed_ms = elapsed.as_millis() as u64,
                budget_ms = budget.as_millis() as u64,
                "frame exceeded time budget"
            );
        }
        debug!(frame = self.frame, "frame end");
    }

    /// Spawn one system as an isolated task and track it in the await-set.
    fn dispatch(&mut self, spec: Arc<SystemSpec>) {
        let task_id = Uuid::new_v4();
        self.await_set.insert(task_id, spec.tag.clone());

        let store = self.store.clone();
        let ctx = Arc::clone(&self.frame_data);
        let tx = self.tx.clone();
        debug!(system = %spec.tag, phase = %spec.phase, %task_id, "dispatching system");

        tokio::spawn(async move {
            let result = run_guarded(&spec, &ctx, &store);
            let _ = tx
                .send(DriverEvent::Completed {
                    task_id,
                    system: spec.tag.clone(),
                    result,
                })
                .await;
        });
    }

    /// Run shutdown systems synchronously, in insertion order, against the
    /// last known frame data.
    fn run_shutdown(&self) -> Result<(), WorldError> {
        info!(
            systems = self.schedule.shutdown().len(),
            "running shutdown systems"
        );
        for spec in self.schedule.shutdown() {
            debug!(system = %spec.tag, "running shutdown system");
            if let Err(message) = run_guarded(spec, &self.frame_data, &self.store) {
                return Err(WorldError::SystemCrash {
                    system: spec.tag.clone(),
                    message,
                });
            }
        }
        Ok(())
    }

    fn snapshot(&self) -> Result<FrameSnapshot, WorldError> {
        if !self.debug {
            return Err(WorldError::DebugDisabled);
        }
        let mut in_flight: Vec<SystemTag> = self.await_set.values().cloned().collect();
        in_flight.sort();
        Ok(FrameSnapshot {
            status: self.status,
            frame: self.frame,
            delta_ms: self.delta_ms,
            timer_finished: self.timer_finished,
            in_flight,
            queued_systems: self.pending.len(),
            queued_batches: self.batches.len(),
            pending_events: self.store.pending_events(),
        })
    }
}

/// Execute a system, converting both returned errors and panics into a
/// message for the completion event.
fn run_guarded(
    spec: &SystemSpec,
    ctx: &FrameContext,
    store: &StoreHandle,
) -> Result<(), String> {
    let guarded = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        spec.system.run(ctx, store)
    }));
    match guarded {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => Err(format!("{err:#}")),
        Err(panic) => Err(panic_message(panic.as_ref())),
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "system panicked".to_string()
    }
}
