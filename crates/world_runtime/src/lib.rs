//! # world_runtime
//!
//! The frame driver and world lifecycle of the ECS scheduler.
//!
//! A [`World`] owns a long-running control task that cycles through the
//! schedule's phases every frame: it refreshes run conditions, drains the
//! event queue into batches, dispatches systems as isolated tasks (one at a
//! time for sync phases, one whole conflict-free batch at a time for the
//! async phase), and paces frames under the configured FPS ceiling. On the
//! shutdown signal the driver runs shutdown systems in order and terminates.
//!
//! ```rust,no_run
//! use world_runtime::{World, WorldConfig};
//! use world_schedule::{SystemOptions, SystemRegistry};
//!
//! # fn registry() -> SystemRegistry { SystemRegistry::new() }
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = WorldConfig::new().with_fps_limit(60).with_max_frames(100);
//!     let world = World::spawn(config, registry(), |schedule| {
//!         schedule.add_system("movement", SystemOptions::new())
//!     })?;
//!     world.wait().await?;
//!     Ok(())
//! }
//! ```

pub mod conditions;
pub mod config;
mod driver;
pub mod error;
pub mod snapshot;
pub mod world;

pub use conditions::ConditionCache;
pub use config::{FpsLimit, WorldConfig};
pub use driver::Status;
pub use error::WorldError;
pub use snapshot::FrameSnapshot;
pub use world::World;
