//! Schedule-construction error types.

use world_component::SystemTag;

/// Errors raised while building a schedule.
///
/// All of these surface synchronously to the caller of the setup callback;
/// nothing is retried.
#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    /// The same system tag was added twice (in any phase).
    #[error("system '{0}' is already present in the schedule")]
    DuplicateSystem(SystemTag),

    /// The tag does not name anything registered as a system.
    #[error("'{0}' does not name a registered system")]
    NotASystem(SystemTag),

    /// A `run_after` constraint references a system that has not been added
    /// yet. The order of adds is significant.
    #[error("system '{system}' runs after unknown system '{predecessor}'")]
    UnknownPredecessor {
        /// The system carrying the constraint.
        system: SystemTag,
        /// The referenced predecessor that is not in the plan.
        predecessor: SystemTag,
    },

    /// Invalid world-level configuration.
    #[error("invalid world configuration: {0}")]
    BadConfig(String),
}
