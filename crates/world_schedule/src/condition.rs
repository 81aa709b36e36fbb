//! Run conditions — nullary predicates gating system execution.
//!
//! Every condition has a stable identity so the frame driver can evaluate
//! each distinct predicate exactly once per frame and cache the result.
//! State conditions are identified by the state value they test; custom
//! predicates get a unique id at construction time, shared by clones.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::Value;

use world_store::StoreHandle;
use world_store::store::WORLD_STATE_KEY;

/// A user-supplied predicate over the stores.
///
/// Returns a dynamically-typed value; anything other than a boolean is a
/// fatal condition error at frame start.
pub type ConditionFn = dyn Fn(&StoreHandle) -> Value + Send + Sync;

static NEXT_CUSTOM_ID: AtomicU64 = AtomicU64::new(1);

/// The cache identity of a condition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConditionKey {
    /// World state equals the given value.
    InState(String),
    /// World state differs from the given value.
    NotInState(String),
    /// A custom predicate, identified by its construction id.
    Custom(u64),
}

/// A run condition attached to a system.
///
/// All conditions on one system combine by conjunction: the system runs only
/// if every condition holds.
#[derive(Clone)]
pub enum Condition {
    /// Holds when the world state resource equals the given state name.
    InState(String),
    /// Holds when the world state resource differs from the given state name.
    NotInState(String),
    /// A custom predicate over the stores.
    Custom {
        /// Unique id assigned at construction; clones share it.
        id: u64,
        /// The predicate itself.
        predicate: Arc<ConditionFn>,
    },
}

impl Condition {
    /// Condition holding while the world is in the named state.
    #[must_use]
    pub fn in_state(state: impl Into<String>) -> Self {
        Self::InState(state.into())
    }

    /// Condition holding while the world is *not* in the named state.
    #[must_use]
    pub fn not_in_state(state: impl Into<String>) -> Self {
        Self::NotInState(state.into())
    }

    /// Wrap a custom predicate.
    ///
    /// The predicate must return `Value::Bool`; any other value aborts the
    /// frame with a condition error.
    #[must_use]
    pub fn custom(predicate: impl Fn(&StoreHandle) -> Value + Send + Sync + 'static) -> Self {
        Self::Custom {
            id: NEXT_CUSTOM_ID.fetch_add(1, Ordering::Relaxed),
            predicate: Arc::new(predicate),
        }
    }

    /// Returns the cache identity of this condition.
    #[must_use]
    pub fn key(&self) -> ConditionKey {
        match self {
            Self::InState(s) => ConditionKey::InState(s.clone()),
            Self::NotInState(s) => ConditionKey::NotInState(s.clone()),
            Self::Custom { id, .. } => ConditionKey::Custom(*id),
        }
    }

    /// Evaluate the condition against the stores.
    ///
    /// State conditions read the reserved `world_state` resource; an unset
    /// state matches no `InState` and every `NotInState`.
    ///
    /// # Errors
    ///
    /// Returns the offending value when a custom predicate yields anything
    /// other than a boolean.
    pub fn evaluate(&self, store: &StoreHandle) -> Result<bool, Value> {
        match self {
            Self::InState(s) => Ok(store.resource(WORLD_STATE_KEY) == Some(Value::String(s.clone()))),
            Self::NotInState(s) => {
                Ok(store.resource(WORLD_STATE_KEY) != Some(Value::String(s.clone())))
            }
            Self::Custom { predicate, .. } => match predicate(store) {
                Value::Bool(b) => Ok(b),
                other => Err(other),
            },
        }
    }
}

impl PartialEq for Condition {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl std::fmt::Debug for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InState(s) => write!(f, "InState({s:?})"),
            Self::NotInState(s) => write!(f, "NotInState({s:?})"),
            Self::Custom { id, .. } => write!(f, "Custom(#{id})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_in_state_matches_world_state() {
        let store = StoreHandle::new();
        let cond = Condition::in_state("playing");

        assert_eq!(cond.evaluate(&store), Ok(false));
        store.set_state(json!("playing"));
        assert_eq!(cond.evaluate(&store), Ok(true));
        store.set_state(json!("paused"));
        assert_eq!(cond.evaluate(&store), Ok(false));
    }

    #[test]
    fn test_not_in_state() {
        let store = StoreHandle::new();
        let cond = Condition::not_in_state("paused");

        // Unset state is "not in" every state.
        assert_eq!(cond.evaluate(&store), Ok(true));
        store.set_state(json!("paused"));
        assert_eq!(cond.evaluate(&store), Ok(false));
    }

    #[test]
    fn test_custom_predicate() {
        let store = StoreHandle::new();
        let cond = Condition::custom(|s| Value::Bool(s.resource("score").is_some()));

        assert_eq!(cond.evaluate(&store), Ok(false));
        store.set_resource("score", json!(10));
        assert_eq!(cond.evaluate(&store), Ok(true));
    }

    #[test]
    fn test_custom_non_bool_is_error() {
        let store = StoreHandle::new();
        let cond = Condition::custom(|_| json!(42));
        assert_eq!(cond.evaluate(&store), Err(json!(42)));
    }

    #[test]
    fn test_clone_shares_identity() {
        let cond = Condition::custom(|_| Value::Bool(true));
        let clone = cond.clone();
        assert_eq!(cond.key(), clone.key());
        assert_eq!(cond, clone);
    }

    #[test]
    fn test_distinct_customs_have_distinct_identity() {
        let a = Condition::custom(|_| Value::Bool(true));
        let b = Condition::custom(|_| Value::Bool(true));
        assert_ne!(a.key(), b.key());
    }

    #[test]
    fn test_state_conditions_identified_by_value() {
        assert_eq!(Condition::in_state("menu"), Condition::in_state("menu"));
        assert_ne!(Condition::in_state("menu"), Condition::in_state("game"));
        assert_ne!(Condition::in_state("menu"), Condition::not_in_state("menu"));
    }
}
