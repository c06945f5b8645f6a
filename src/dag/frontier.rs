// src/dag/frontier.rs

//! Readiness tracking for a single run.
//!
//! Each unit gets an atomic counter of dependencies that have not started
//! yet. When a unit starts, the counters of its dependents are decremented;
//! the one decrement that takes a counter from 1 to 0 hands the dependent
//! back as ready. No other completion can observe that transition, so every
//! unit is released at most once no matter how its dependencies interleave.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::trace;

use crate::dag::graph::DependencyGraph;
use crate::errors::{Result, StartOrderError};

#[derive(Debug)]
pub struct Frontier {
    remaining: HashMap<String, AtomicUsize>,
}

impl Frontier {
    /// Snapshot the dependency counts of every unit in `graph`.
    pub fn new<U>(graph: &DependencyGraph<U>) -> Self {
        let remaining = graph
            .adjacency()
            .into_iter()
            .map(|(name, deps)| (name, AtomicUsize::new(deps.len())))
            .collect();

        Self { remaining }
    }

    /// Units that are ready before anything has started.
    pub fn initial(&self) -> Vec<String> {
        let mut ready: Vec<String> = self
            .remaining
            .iter()
            .filter(|(_, count)| count.load(Ordering::Acquire) == 0)
            .map(|(name, _)| name.clone())
            .collect();
        ready.sort();
        ready
    }

    /// Record that one dependency of `dependent` has started.
    ///
    /// Returns `true` if this call satisfied the last outstanding dependency,
    /// in which case the caller owns the launch of `dependent`.
    pub fn release(&self, dependent: &str) -> Result<bool> {
        let counter = self
            .remaining
            .get(dependent)
            .ok_or_else(|| StartOrderError::UnitNotFound(dependent.to_string()))?;

        let previous = counter
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .unwrap_or(0);

        trace!(unit = %dependent, remaining = previous.saturating_sub(1), "dependency released");
        Ok(previous == 1)
    }

    /// Remaining dependency count for `name` (diagnostics and tests).
    pub fn remaining(&self, name: &str) -> Option<usize> {
        self.remaining.get(name).map(|c| c.load(Ordering::Acquire))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;
    use std::thread;

    use super::*;
    use crate::types::UnitSpec;

    #[test]
    fn initial_frontier_matches_leaves() {
        let g = DependencyGraph::from_units(vec![
            UnitSpec::new("db"),
            UnitSpec::new("cache"),
            UnitSpec::new("api").depends_on_all(["db", "cache"]),
        ])
        .unwrap();
        let frontier = Frontier::new(&g);

        assert_eq!(frontier.initial(), g.leaves());
        assert_eq!(frontier.remaining("api"), Some(2));
    }

    #[test]
    fn only_last_release_reports_ready() {
        let g = DependencyGraph::from_units(vec![
            UnitSpec::new("db"),
            UnitSpec::new("cache"),
            UnitSpec::new("api").depends_on_all(["db", "cache"]),
        ])
        .unwrap();
        let frontier = Frontier::new(&g);

        assert!(!frontier.release("api").unwrap());
        assert!(frontier.release("api").unwrap());
        // Counter saturates at zero and never reports ready twice.
        assert!(!frontier.release("api").unwrap());
        assert!(frontier.release("nope").is_err());
    }

    #[test]
    fn concurrent_releases_hand_out_exactly_one_launch() {
        let deps: Vec<String> = (0..32).map(|i| format!("dep_{i}")).collect();
        let mut units: Vec<UnitSpec> = deps.iter().map(UnitSpec::new).collect();
        units.push(UnitSpec::new("sink").depends_on_all(deps.clone()));

        let g = DependencyGraph::from_units(units).unwrap();
        let frontier = Arc::new(Frontier::new(&g));
        let launches = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..deps.len())
            .map(|_| {
                let frontier = Arc::clone(&frontier);
                let launches = Arc::clone(&launches);
                thread::spawn(move || {
                    if frontier.release("sink").unwrap() {
                        launches.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(launches.load(Ordering::SeqCst), 1);
        assert_eq!(frontier.remaining("sink"), Some(0));
    }
}
