//! # world_app — demo coordinator
//!
//! Wires a small moving-particles world together and runs it:
//!
//! 1. A startup system spawns a handful of entities with position/velocity.
//! 2. The async phase integrates positions and drifts velocities in
//!    parallel batches (disjoint lock sets).
//! 3. A frame-end system reports progress and emits boundary-bounce events
//!    consumed the following frame.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use serde_json::json;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use world_component::{ComponentTag, LockSet, SystemTag};
use world_runtime::{World, WorldConfig};
use world_schedule::{FrameContext, System, SystemOptions, SystemRegistry};
use world_store::StoreHandle;

#[derive(Parser)]
#[command(name = "world-app", about = "Demo world running the frame scheduler")]
struct Args {
    /// Frame-rate ceiling (omit for unlimited).
    #[arg(short, long)]
    fps: Option<u32>,

    /// Number of frames to run (0 = until Ctrl-C).
    #[arg(short, long, default_value_t = 120)]
    max_frames: u64,

    /// Number of particles to spawn.
    #[arg(short, long, default_value_t = 5)]
    particles: u64,

    /// Enable the debug snapshot surface.
    #[arg(long)]
    debug: bool,
}

/// Spawns the initial particles. Entity ids double as event ids later.
struct SpawnParticles {
    count: u64,
}

impl System for SpawnParticles {
    fn tag(&self) -> SystemTag {
        SystemTag::from("spawn_particles")
    }

    fn run(&self, _ctx: &FrameContext, store: &StoreHandle) -> Result<()> {
        for i in 0..self.count {
            let entity = store.spawn_entity();
            store.set(entity, "position", json!({"x": 0.0, "y": i as f64}));
            store.set(entity, "velocity", json!({"x": 1.0, "y": 0.5}));
        }
        info!(count = self.count, "spawned particles");
        Ok(())
    }
}

/// Integrates positions from velocities. Locks `position` only.
struct Movement;

impl System for Movement {
    fn tag(&self) -> SystemTag {
        SystemTag::from("movement")
    }

    fn locked_components(&self) -> LockSet {
        LockSet::new().lock("position")
    }

    fn run(&self, ctx: &FrameContext, store: &StoreHandle) -> Result<()> {
        let dt = ctx.delta_ms as f64 / 1000.0;
        let position = ComponentTag::from("position");
        let velocity = ComponentTag::from("velocity");

        for entity in store.entities_with(&position) {
            let (Some(pos), Some(vel)) = (store.get(entity, &position), store.get(entity, &velocity))
            else {
                continue;
            };
            let moved = json!({
                "x": pos["x"].as_f64().unwrap_or(0.0) + vel["x"].as_f64().unwrap_or(0.0) * dt,
                "y": pos["y"].as_f64().unwrap_or(0.0) + vel["y"].as_f64().unwrap_or(0.0) * dt,
            });
            store.set(entity, position.clone(), moved);
        }
        Ok(())
    }
}

/// Slowly damps velocities. Locks `velocity` only, so it batches with
/// `Movement`.
struct Drag;

impl System for Drag {
    fn tag(&self) -> SystemTag {
        SystemTag::from("drag")
    }

    fn locked_components(&self) -> LockSet {
        LockSet::new().lock("velocity")
    }

    fn run(&self, ctx: &FrameContext, store: &StoreHandle) -> Result<()> {
        let damping = (1.0 - ctx.delta_ms as f64 / 10_000.0).max(0.0);
        let velocity = ComponentTag::from("velocity");

        for entity in store.entities_with(&velocity) {
            let Some(vel) = store.get(entity, &velocity) else {
                continue;
            };
            let damped = json!({
                "x": vel["x"].as_f64().unwrap_or(0.0) * damping,
                "y": vel["y"].as_f64().unwrap_or(0.0) * damping,
            });
            store.set(entity, velocity.clone(), damped);
        }
        Ok(())
    }
}

/// Logs frame progress and the bounce events emitted the previous frame.
struct Report;

impl System for Report {
    fn tag(&self) -> SystemTag {
        SystemTag::from("report")
    }

    fn run(&self, ctx: &FrameContext, store: &StoreHandle) -> Result<()> {
        let bounces = ctx.events_of(&ComponentTag::from("bounce")).count();
        debug!(
            delta_ms = ctx.delta_ms,
            bounces,
            particles = store.entities_with(&ComponentTag::from("position")).len(),
            "frame report"
        );

        // Emit a bounce for every particle past x = 10; observed next frame.
        let position = ComponentTag::from("position");
        for entity in store.entities_with(&position) {
            if let Some(pos) = store.get(entity, &position)
                && pos["x"].as_f64().unwrap_or(0.0) > 10.0
            {
                store.insert_event("bounce", entity.id(), pos);
            }
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();
    info!(
        fps = args.fps,
        max_frames = args.max_frames,
        "starting demo world"
    );

    let mut config = WorldConfig::new()
        .with_max_frames(args.max_frames)
        .with_debug(args.debug)
        .with_resource("world_state", json!("running"));
    if let Some(fps) = args.fps {
        config = config.with_fps_limit(fps);
    }

    let registry = SystemRegistry::new()
        .with(Arc::new(SpawnParticles {
            count: args.particles,
        }))
        .with(Arc::new(Movement))
        .with(Arc::new(Drag))
        .with(Arc::new(Report));

    let world = World::spawn(config, registry, |s| {
        s.add_startup_system("spawn_particles")?
            .add_system("movement", SystemOptions::new().in_state("running"))?
            .add_system("drag", SystemOptions::new())?
            .add_frame_end_system("report", SystemOptions::new())
    })?;

    if args.max_frames == 0 {
        tokio::signal::ctrl_c().await?;
        world.shutdown().await?;
    } else {
        world.wait().await?;
    }

    info!("demo world finished");
    Ok(())
}
