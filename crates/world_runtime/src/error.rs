//! Runtime error types.

use serde_json::Value;
use uuid::Uuid;

use world_component::SystemTag;
use world_schedule::ScheduleError;

/// Errors raised by a running world.
///
/// Everything except [`WorldError::DebugDisabled`] is fatal: the world task
/// terminates with the error and recovery is delegated to whatever
/// supervises it. Nothing is retried.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// Schedule construction failed.
    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    /// A run-condition predicate returned a non-boolean value.
    #[error("run condition returned a non-boolean value: {value}")]
    BadCondition {
        /// The offending value.
        value: Value,
    },

    /// A completion signal arrived for a task that is not awaited —
    /// scheduling state is corrupted.
    #[error("completion signal for unknown task {task_id}")]
    UnexpectedCompletion {
        /// The unknown task identifier.
        task_id: Uuid,
    },

    /// A system task returned an error or panicked.
    #[error("system '{system}' crashed: {message}")]
    SystemCrash {
        /// The crashing system.
        system: SystemTag,
        /// The error or panic message.
        message: String,
    },

    /// The debug surface was invoked but the debug toggle is off. Non-fatal;
    /// returned as a result to the caller.
    #[error("debug surface is disabled")]
    DebugDisabled,

    /// The world task is no longer running.
    #[error("world is no longer running")]
    Terminated,
}
