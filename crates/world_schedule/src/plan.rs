//! Batching analyzer — places async systems into conflict-free parallel batches.
//!
//! The algorithm is a greedy first-fit:
//! 1. Resolve the system's `run_after` constraints to a floor index: one past
//!    the last batch containing any named predecessor.
//! 2. Scan batches from the floor; place the system in the first batch where
//!    its lock set conflicts with nobody.
//! 3. If no batch accepts it, append a new batch.
//!
//! This produces a valid (though not necessarily optimal) plan that
//! guarantees no two conflicting systems share a batch, and is deterministic
//! in the order systems are added. Ordering constraints only ever point
//! backwards, so placement always terminates.

use std::sync::Arc;

use crate::error::ScheduleError;
use crate::system::SystemSpec;

/// The ordered list of parallel batches for the async phase.
pub type BatchPlan = Vec<Vec<Arc<SystemSpec>>>;

/// Place one async system into the plan.
///
/// # Errors
///
/// Returns [`ScheduleError::UnknownPredecessor`] if a `run_after` tag is not
/// yet present in any batch.
pub fn place(plan: &mut BatchPlan, spec: Arc<SystemSpec>) -> Result<(), ScheduleError> {
    let mut floor = 0;
    for predecessor in &spec.run_after {
        let found = plan
            .iter()
            .position(|batch| batch.iter().any(|s| &s.tag == predecessor));
        match found {
            Some(idx) => floor = floor.max(idx + 1),
            None => {
                return Err(ScheduleError::UnknownPredecessor {
                    system: spec.tag.clone(),
                    predecessor: predecessor.clone(),
                });
            }
        }
    }

    for batch in plan.iter_mut().skip(floor) {
        let conflicts = batch.iter().any(|s| s.locks.conflicts_with(&spec.locks));
        if !conflicts {
            batch.push(spec);
            return Ok(());
        }
    }

    plan.push(vec![spec]);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::Condition;
    use crate::system::{FrameContext, Phase, System};
    use world_component::{LockSet, SystemTag};
    use world_store::StoreHandle;

    struct Noop;

    impl System for Noop {
        fn tag(&self) -> SystemTag {
            SystemTag::from("noop")
        }

        fn run(&self, _ctx: &FrameContext, _store: &StoreHandle) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn spec(tag: &str, locks: LockSet, run_after: &[&str]) -> Arc<SystemSpec> {
        Arc::new(SystemSpec {
            tag: SystemTag::from(tag),
            phase: Phase::Async,
            run_after: run_after.iter().map(|&t| SystemTag::from(t)).collect(),
            conditions: Vec::<Condition>::new(),
            locks,
            system: Arc::new(Noop),
        })
    }

    fn tags(plan: &BatchPlan) -> Vec<Vec<&str>> {
        plan.iter()
            .map(|batch| batch.iter().map(|s| s.tag.as_str()).collect())
            .collect()
    }

    #[test]
    fn test_no_conflict_goes_into_first_batch() {
        let mut plan = BatchPlan::new();
        place(&mut plan, spec("a", LockSet::new().lock("c1"), &[])).unwrap();
        place(&mut plan, spec("b", LockSet::new().lock("c2"), &[])).unwrap();
        assert_eq!(tags(&plan), vec![vec!["a", "b"]]);
    }

    #[test]
    fn test_lock_conflict_forces_new_batch() {
        // a and b both lock c1; c locks c2 and still fits batch 0.
        let mut plan = BatchPlan::new();
        place(&mut plan, spec("a", LockSet::new().lock("c1"), &[])).unwrap();
        place(&mut plan, spec("b", LockSet::new().lock("c1"), &[])).unwrap();
        place(&mut plan, spec("c", LockSet::new().lock("c2"), &[])).unwrap();
        assert_eq!(tags(&plan), vec![vec!["a", "c"], vec!["b"]]);
    }

    #[test]
    fn test_scoped_lock_conflicts_with_bare() {
        let mut plan = BatchPlan::new();
        place(&mut plan, spec("a", LockSet::new().lock("c1"), &[])).unwrap();
        place(
            &mut plan,
            spec("b", LockSet::new().lock_scoped("c1", "player"), &[]),
        )
        .unwrap();
        assert_eq!(tags(&plan), vec![vec!["a"], vec!["b"]]);
    }

    #[test]
    fn test_run_after_crosses_batches() {
        // c conflicts with nothing but must land strictly after a.
        let mut plan = BatchPlan::new();
        place(&mut plan, spec("a", LockSet::new().lock("c1"), &[])).unwrap();
        place(&mut plan, spec("b", LockSet::new().lock("c2"), &[])).unwrap();
        place(&mut plan, spec("c", LockSet::new().lock("c3"), &["a"])).unwrap();
        assert_eq!(tags(&plan), vec![vec!["a", "b"], vec!["c"]]);
    }

    #[test]
    fn test_run_after_floor_is_max_over_predecessors() {
        let mut plan = BatchPlan::new();
        place(&mut plan, spec("a", LockSet::new().lock("c1"), &[])).unwrap();
        place(&mut plan, spec("b", LockSet::new().lock("c1"), &[])).unwrap(); // batch 1
        place(&mut plan, spec("c", LockSet::new().lock("c2"), &["a", "b"])).unwrap();
        assert_eq!(tags(&plan), vec![vec!["a"], vec!["b"], vec!["c"]]);
    }

    #[test]
    fn test_unknown_predecessor() {
        let mut plan = BatchPlan::new();
        let err = place(&mut plan, spec("c", LockSet::new(), &["ghost"])).unwrap_err();
        match err {
            ScheduleError::UnknownPredecessor { system, predecessor } => {
                assert_eq!(system, SystemTag::from("c"));
                assert_eq!(predecessor, SystemTag::from("ghost"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_every_system_in_exactly_one_batch() {
        let mut plan = BatchPlan::new();
        let names = ["a", "b", "c", "d", "e"];
        for (i, name) in names.iter().enumerate() {
            let lock = if i % 2 == 0 { "even" } else { "odd" };
            place(&mut plan, spec(name, LockSet::new().lock(lock), &[])).unwrap();
        }

        let mut placed: Vec<&str> = plan
            .iter()
            .flatten()
            .map(|s| s.tag.as_str())
            .collect();
        placed.sort_unstable();
        let mut expected = names.to_vec();
        expected.sort_unstable();
        assert_eq!(placed, expected);
    }

    #[test]
    fn test_no_batch_contains_conflicting_pair() {
        let mut plan = BatchPlan::new();
        place(&mut plan, spec("a", LockSet::new().lock("c1").lock("c2"), &[])).unwrap();
        place(&mut plan, spec("b", LockSet::new().lock("c2"), &[])).unwrap();
        place(&mut plan, spec("c", LockSet::new().lock_scoped("c1", "t"), &[])).unwrap();
        place(&mut plan, spec("d", LockSet::new().lock("c3"), &[])).unwrap();

        for batch in &plan {
            for (i, s1) in batch.iter().enumerate() {
                for s2 in &batch[i + 1..] {
                    assert!(
                        !s1.locks.conflicts_with(&s2.locks),
                        "batch contains conflicting systems {} and {}",
                        s1.tag,
                        s2.tag
                    );
                }
            }
        }
    }
}
