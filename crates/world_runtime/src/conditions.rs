//! The run-condition cache.
//!
//! At the start of every frame the driver evaluates each distinct condition
//! in the schedule exactly once and stores the result here; per-system
//! gating reads the cache for the rest of the frame. Startup systems bypass
//! the cache entirely (they cannot carry conditions), so an empty cache
//! simply gates every conditional system off.

use std::collections::HashMap;

use tracing::error;

use world_schedule::{Condition, ConditionKey};
use world_store::StoreHandle;

use crate::error::WorldError;

/// Cached boolean values for every distinct run condition, refreshed once
/// per frame and read-only during it.
#[derive(Debug, Default)]
pub struct ConditionCache {
    values: HashMap<ConditionKey, bool>,
}

impl ConditionCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-evaluate every condition against the stores.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::BadCondition`] when a custom predicate yields a
    /// non-boolean value; the frame aborts.
    pub fn refresh(
        &mut self,
        conditions: &[Condition],
        store: &StoreHandle,
    ) -> Result<(), WorldError> {
        self.values.clear();
        for condition in conditions {
            match condition.evaluate(store) {
                Ok(value) => {
                    self.values.insert(condition.key(), value);
                }
                Err(value) => {
                    error!(condition = ?condition, %value, "run condition returned a non-boolean value");
                    return Err(WorldError::BadCondition { value });
                }
            }
        }
        Ok(())
    }

    /// Returns `true` when every given condition holds.
    ///
    /// A condition missing from the cache counts as `false`.
    #[must_use]
    pub fn passes(&self, conditions: &[Condition]) -> bool {
        conditions
            .iter()
            .all(|c| self.values.get(&c.key()).copied().unwrap_or(false))
    }
}
