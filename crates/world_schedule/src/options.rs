//! Per-system scheduling options.
//!
//! Options attach run conditions and ordering constraints to a system at
//! add time. System sets carry options too; while a set is active, every
//! inner add receives the set's options merged with its own.

use world_component::SystemTag;

use crate::condition::Condition;

/// Options accepted by the frame-phase add operations.
#[derive(Debug, Clone, Default)]
pub struct SystemOptions {
    /// States in which the system runs. Each listed state contributes its
    /// own predicate, and all predicates on a system combine by conjunction
    /// — listing several states therefore requires the world state to equal
    /// all of them at once. In practice a single value is supplied.
    pub run_in_state: Vec<String>,
    /// States in which the system is skipped.
    pub run_not_in_state: Vec<String>,
    /// Custom predicates gating the system.
    pub run_if: Vec<Condition>,
    /// Systems that must be batched strictly before this one. Only honored
    /// by the async phase; sync phases preserve insertion order and ignore
    /// it with a warning.
    pub run_after: Vec<SystemTag>,
}

impl SystemOptions {
    /// Create an empty option set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Gate the system on the world being in the named state.
    #[must_use]
    pub fn in_state(mut self, state: impl Into<String>) -> Self {
        self.run_in_state.push(state.into());
        self
    }

    /// Gate the system on the world *not* being in the named state.
    #[must_use]
    pub fn not_in_state(mut self, state: impl Into<String>) -> Self {
        self.run_not_in_state.push(state.into());
        self
    }

    /// Gate the system on a custom predicate.
    #[must_use]
    pub fn run_if(mut self, condition: Condition) -> Self {
        self.run_if.push(condition);
        self
    }

    /// Require the named system to be batched strictly before this one.
    #[must_use]
    pub fn after(mut self, system: impl Into<SystemTag>) -> Self {
        self.run_after.push(system.into());
        self
    }

    /// Returns `true` if no option is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.run_in_state.is_empty()
            && self.run_not_in_state.is_empty()
            && self.run_if.is_empty()
            && self.run_after.is_empty()
    }

    /// Merge another option set into this one.
    ///
    /// Per key: values union, flattened, de-duplicated. Merging an option
    /// set with itself is a no-op.
    pub fn merge(&mut self, other: &SystemOptions) {
        for s in &other.run_in_state {
            if !self.run_in_state.contains(s) {
                self.run_in_state.push(s.clone());
            }
        }
        for s in &other.run_not_in_state {
            if !self.run_not_in_state.contains(s) {
                self.run_not_in_state.push(s.clone());
            }
        }
        for c in &other.run_if {
            if !self.run_if.iter().any(|e| e.key() == c.key()) {
                self.run_if.push(c.clone());
            }
        }
        for t in &other.run_after {
            if !self.run_after.contains(t) {
                self.run_after.push(t.clone());
            }
        }
    }

    /// Flatten the option set into the system's condition list, de-duplicated
    /// by condition identity.
    #[must_use]
    pub fn conditions(&self) -> Vec<Condition> {
        let mut out: Vec<Condition> = Vec::new();
        let mut push = |c: Condition| {
            if !out.iter().any(|e| e.key() == c.key()) {
                out.push(c);
            }
        };
        for s in &self.run_in_state {
            push(Condition::in_state(s.clone()));
        }
        for s in &self.run_not_in_state {
            push(Condition::not_in_state(s.clone()));
        }
        for c in &self.run_if {
            push(c.clone());
        }
        out
    }
}
