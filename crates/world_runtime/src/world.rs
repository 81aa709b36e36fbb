//! The world process — owns the frame driver and the shared stores.

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::info;

use world_schedule::{Schedule, ScheduleBuilder, ScheduleError, SystemRegistry};
use world_store::StoreHandle;

use crate::config::WorldConfig;
use crate::driver::{DriverEvent, FrameDriver};
use crate::error::WorldError;
use crate::snapshot::FrameSnapshot;

/// Capacity of the driver's event channel. Completions, timer firings, and
/// control messages all share it.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// A running world.
///
/// The world owns the frame driver's control task and the shared stores.
/// Dropping the handle does not stop the driver; call [`World::shutdown`]
/// for a clean stop or [`World::wait`] to follow it to termination.
pub struct World {
    tx: mpsc::Sender<DriverEvent>,
    join: JoinHandle<Result<(), WorldError>>,
    store: StoreHandle,
}

impl World {
    /// Build a schedule and start the world.
    ///
    /// The `setup` callback receives a [`ScheduleBuilder`] over the given
    /// registry and declares the schedule; any build-time error surfaces
    /// here, synchronously, before anything runs. On success the driver task
    /// is spawned onto the current tokio runtime: startup systems run once
    /// (seeing the configured startup events), then the frame loop runs
    /// until a shutdown signal or the configured frame ceiling.
    ///
    /// # Errors
    ///
    /// Returns any [`ScheduleError`] from configuration validation or
    /// schedule construction.
    pub fn spawn<F>(
        config: WorldConfig,
        registry: SystemRegistry,
        setup: F,
    ) -> Result<World, ScheduleError>
    where
        F: FnOnce(ScheduleBuilder) -> Result<ScheduleBuilder, ScheduleError>,
    {
        config.validate()?;
        let builder = ScheduleBuilder::new(registry, config.initial_resources.clone());
        let schedule: Schedule = setup(builder)?.finish()?;

        let store = StoreHandle::new();
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let driver = FrameDriver::new(schedule, store.clone(), config, tx.clone(), rx);
        let join = tokio::spawn(driver.run());

        Ok(World { tx, join, store })
    }

    /// A handle to the world's shared stores.
    #[must_use]
    pub fn store(&self) -> StoreHandle {
        self.store.clone()
    }

    /// Request an immutable snapshot of the frame state.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::DebugDisabled`] unless the world was configured
    /// with the debug toggle, or [`WorldError::Terminated`] if the driver is
    /// gone.
    pub async fn snapshot(&self) -> Result<FrameSnapshot, WorldError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(DriverEvent::Snapshot { reply: reply_tx })
            .await
            .map_err(|_| WorldError::Terminated)?;
        reply_rx.await.map_err(|_| WorldError::Terminated)?
    }

    /// Signal shutdown and wait for termination.
    ///
    /// The driver stops accepting frame events, runs shutdown systems in
    /// insertion order, and terminates; this resolves with the world's
    /// terminal result.
    pub async fn shutdown(self) -> Result<(), WorldError> {
        info!("shutdown requested");
        let (ack_tx, ack_rx) = oneshot::channel();
        if self
            .tx
            .send(DriverEvent::Shutdown { ack: ack_tx })
            .await
            .is_ok()
        {
            // The ack fails only when the driver already terminated; the
            // join below reports why.
            let _ = ack_rx.await;
        }
        join_driver(self.join).await
    }

    /// Wait for the world to terminate on its own (frame ceiling or fatal
    /// error) and return its terminal result.
    pub async fn wait(self) -> Result<(), WorldError> {
        join_driver(self.join).await
    }
}

async fn join_driver(join: JoinHandle<Result<(), WorldError>>) -> Result<(), WorldError> {
    match join.await {
        Ok(result) => result,
        Err(_) => Err(WorldError::Terminated),
    }
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World").finish_non_exhaustive()
    }
}
