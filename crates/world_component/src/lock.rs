//! Component-lock declarations for system scheduling.
//!
//! A [`LockSet`] declares which component types a system may mutate. The
//! scheduler uses these declarations to detect conflicts between systems and
//! keep conflicting systems out of the same parallel batch — correctness of
//! concurrent writes is a property of the schedule, not of runtime locking.

use serde::{Deserialize, Serialize};

use crate::tag::ComponentTag;

/// A single lock declaration.
///
/// A lock is either a bare component type, covering every entity's instance
/// of that component, or a component type scoped to entities that carry a
/// marker component (the entity tag).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LockEntry {
    /// Locks the component type for all entities.
    Component(ComponentTag),
    /// Locks the component type only for entities carrying `entity_tag`.
    Scoped {
        /// The component type being locked.
        component: ComponentTag,
        /// The marker component scoping the lock to a subset of entities.
        entity_tag: ComponentTag,
    },
}

impl LockEntry {
    /// A bare component lock.
    #[must_use]
    pub fn component(tag: impl Into<ComponentTag>) -> Self {
        Self::Component(tag.into())
    }

    /// A component lock scoped to entities carrying a marker component.
    #[must_use]
    pub fn scoped(component: impl Into<ComponentTag>, entity_tag: impl Into<ComponentTag>) -> Self {
        Self::Scoped {
            component: component.into(),
            entity_tag: entity_tag.into(),
        }
    }

    /// Checks whether two individual lock entries collide.
    ///
    /// Entries collide when:
    ///
    /// - both lock the same bare component type;
    /// - one locks a bare component type the other locks in scoped form
    ///   (a bare lock covers every entity, including the scoped subset);
    /// - both lock the same `(component, entity_tag)` pair.
    ///
    /// Two scoped locks on the same component with *different* entity tags do
    /// not collide — they cover disjoint entity subsets by contract.
    #[must_use]
    pub fn collides_with(&self, other: &LockEntry) -> bool {
        match (self, other) {
            (LockEntry::Component(a), LockEntry::Component(b)) => a == b,
            (LockEntry::Component(a), LockEntry::Scoped { component, .. })
            | (LockEntry::Scoped { component, .. }, LockEntry::Component(a)) => a == component,
            (
                LockEntry::Scoped {
                    component: c1,
                    entity_tag: t1,
                },
                LockEntry::Scoped {
                    component: c2,
                    entity_tag: t2,
                },
            ) => c1 == c2 && t1 == t2,
        }
    }
}

/// The static set of component locks a system declares.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockSet {
    entries: Vec<LockEntry>,
}

impl LockSet {
    /// Create a new empty lock set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Add a bare component lock.
    #[must_use]
    pub fn lock(mut self, component: impl Into<ComponentTag>) -> Self {
        self.entries.push(LockEntry::component(component));
        self
    }

    /// Add a component lock scoped to entities carrying a marker component.
    #[must_use]
    pub fn lock_scoped(
        mut self,
        component: impl Into<ComponentTag>,
        entity_tag: impl Into<ComponentTag>,
    ) -> Self {
        self.entries.push(LockEntry::scoped(component, entity_tag));
        self
    }

    /// Returns the declared lock entries.
    #[must_use]
    pub fn entries(&self) -> &[LockEntry] {
        &self.entries
    }

    /// Returns `true` if the set declares no locks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Checks whether this lock set conflicts with another.
    ///
    /// Two lock sets conflict when any entry of one collides with any entry
    /// of the other. Systems with conflicting lock sets must not share a
    /// parallel batch.
    #[must_use]
    pub fn conflicts_with(&self, other: &LockSet) -> bool {
        self.entries
            .iter()
            .any(|a| other.entries.iter().any(|b| a.collides_with(b)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_conflict_disjoint_components() {
        let a = LockSet::new().lock("position");
        let b = LockSet::new().lock("velocity");
        assert!(!a.conflicts_with(&b));
    }

    #[test]
    fn test_conflict_same_bare_component() {
        let a = LockSet::new().lock("position");
        let b = LockSet::new().lock("position");
        assert!(a.conflicts_with(&b));
    }

    #[test]
    fn test_conflict_bare_vs_scoped() {
        // A bare lock covers every entity, including the scoped subset.
        let a = LockSet::new().lock("position");
        let b = LockSet::new().lock_scoped("position", "player");
        assert!(a.conflicts_with(&b));
        assert!(b.conflicts_with(&a));
    }

    #[test]
    fn test_conflict_same_scoped_pair() {
        let a = LockSet::new().lock_scoped("position", "player");
        let b = LockSet::new().lock_scoped("position", "player");
        assert!(a.conflicts_with(&b));
    }

    #[test]
    fn test_no_conflict_scoped_different_tags() {
        let a = LockSet::new().lock_scoped("position", "player");
        let b = LockSet::new().lock_scoped("position", "enemy");
        assert!(!a.conflicts_with(&b));
    }

    #[test]
    fn test_empty_set_never_conflicts() {
        let a = LockSet::new();
        let b = LockSet::new().lock("position").lock("velocity");
        assert!(!a.conflicts_with(&b));
        assert!(!a.conflicts_with(&LockSet::new()));
    }

    #[test]
    fn test_multi_entry_sets() {
        let a = LockSet::new().lock("position").lock("velocity");
        let b = LockSet::new().lock("hp").lock_scoped("velocity", "enemy");
        assert!(a.conflicts_with(&b));
    }
}
