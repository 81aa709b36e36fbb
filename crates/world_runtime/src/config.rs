//! World-level configuration.

use std::time::Duration;

use serde_json::Value;

use world_schedule::ScheduleError;
use world_store::EventRecord;

/// The frame-rate ceiling for the world's frame loop.
///
/// A ceiling throttles but never aborts work: if a frame's systems outlast
/// the budget, the frame finishes late and the next one starts immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FpsLimit {
    /// Frames are gated only by system completion.
    #[default]
    Unlimited,
    /// At most this many frames per second. Must be positive.
    Capped(u32),
}

impl FpsLimit {
    /// The per-frame time budget: `1000 / fps` ms, or zero when unlimited.
    #[must_use]
    pub fn frame_budget(self) -> Duration {
        match self {
            FpsLimit::Unlimited => Duration::ZERO,
            FpsLimit::Capped(fps) => Duration::from_secs_f64(1.0 / f64::from(fps)),
        }
    }
}

/// Configuration for a world.
#[derive(Debug, Clone, Default)]
pub struct WorldConfig {
    /// The frame-rate ceiling.
    pub fps_limit: FpsLimit,
    /// Maximum number of frames to run before the world shuts itself down
    /// (0 = unlimited).
    pub max_frames: u64,
    /// Enables the debug snapshot surface.
    pub debug: bool,
    /// Resources seeded into the resource table by the internal startup
    /// system, unless an earlier startup system already set them.
    pub initial_resources: Vec<(String, Value)>,
    /// Events batched into the first frame's data before startup systems run.
    pub initial_events: Vec<EventRecord>,
}

impl WorldConfig {
    /// A default configuration: unlimited FPS, unlimited frames, no debug.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap the frame rate.
    #[must_use]
    pub fn with_fps_limit(mut self, fps: u32) -> Self {
        self.fps_limit = FpsLimit::Capped(fps);
        self
    }

    /// Stop after the given number of frames (0 = unlimited).
    #[must_use]
    pub fn with_max_frames(mut self, max_frames: u64) -> Self {
        self.max_frames = max_frames;
        self
    }

    /// Enable the debug snapshot surface.
    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Seed a default resource.
    #[must_use]
    pub fn with_resource(mut self, name: impl Into<String>, value: Value) -> Self {
        self.initial_resources.push((name.into(), value));
        self
    }

    /// Queue an event for the first frame.
    #[must_use]
    pub fn with_startup_event(mut self, event_type: &str, id: u64, payload: Value) -> Self {
        self.initial_events.push(EventRecord::new(event_type, id, payload));
        self
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::BadConfig`] for a zero FPS cap.
    pub fn validate(&self) -> Result<(), ScheduleError> {
        if self.fps_limit == FpsLimit::Capped(0) {
            return Err(ScheduleError::BadConfig(
                "fps_limit must be positive or unlimited".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_unlimited() {
        let config = WorldConfig::new();
        assert_eq!(config.fps_limit, FpsLimit::Unlimited);
        assert_eq!(config.max_frames, 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_frame_budget() {
        assert_eq!(FpsLimit::Unlimited.frame_budget(), Duration::ZERO);
        let budget = FpsLimit::Capped(60).frame_budget();
        assert!(budget > Duration::from_millis(16));
        assert!(budget < Duration::from_millis(17));
    }

    #[test]
    fn test_zero_fps_is_bad_config() {
        let config = WorldConfig::new().with_fps_limit(0);
        assert!(matches!(
            config.validate(),
            Err(ScheduleError::BadConfig(_))
        ));
    }
}
