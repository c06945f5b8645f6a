// src/dag/cycle.rs

//! Cycle detection over the dependency graph.
//!
//! Depth-first search with three colors kept in a side map:
//! - `Unvisited`: not reached yet
//! - `InProgress`: on the current DFS stack
//! - `Done`: fully explored, known not to lead back into the stack
//!
//! An edge into an `InProgress` vertex is a back-edge, i.e. a cycle. The
//! cycle is read off the DFS stack, from the vertex the back-edge points to
//! through to the vertex it leaves from, and closed with the start again.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use tracing::warn;

use crate::dag::graph::DependencyGraph;
use crate::errors::{Result, StartOrderError};

/// A dependency cycle, starting and ending at the same unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CyclePath(Vec<String>);

impl CyclePath {
    /// Units along the cycle; the first and last entries are the same unit.
    pub fn units(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for CyclePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(" -> "))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    Unvisited,
    InProgress,
    Done,
}

struct CycleSearch<'a> {
    adjacency: &'a BTreeMap<String, Vec<String>>,
    colors: HashMap<&'a str, Color>,
    stack: Vec<&'a str>,
}

impl<'a> CycleSearch<'a> {
    fn new(adjacency: &'a BTreeMap<String, Vec<String>>) -> Self {
        Self {
            adjacency,
            colors: HashMap::with_capacity(adjacency.len()),
            stack: Vec::new(),
        }
    }

    fn color(&self, key: &str) -> Color {
        self.colors.get(key).copied().unwrap_or(Color::Unvisited)
    }

    fn run(mut self) -> Option<CyclePath> {
        let adjacency = self.adjacency;
        for key in adjacency.keys() {
            if self.color(key) == Color::Unvisited {
                if let Some(path) = self.visit(key) {
                    return Some(path);
                }
            }
        }
        None
    }

    /// Explores everything reachable from `root` with an explicit frame
    /// stack, so chain depth is bounded by heap rather than thread stack.
    fn visit(&mut self, root: &'a str) -> Option<CyclePath> {
        let adjacency = self.adjacency;
        let deps_of = |key: &str| adjacency.get(key).map(Vec::as_slice).unwrap_or(&[]);

        // (vertex, index of the next dependency to look at)
        let mut frames: Vec<(&'a str, usize)> = vec![(root, 0)];
        self.colors.insert(root, Color::InProgress);
        self.stack.push(root);

        while let Some(frame) = frames.last_mut() {
            let (key, next) = *frame;
            let Some(dep) = deps_of(key).get(next).map(String::as_str) else {
                frames.pop();
                self.stack.pop();
                self.colors.insert(key, Color::Done);
                continue;
            };
            frame.1 += 1;

            match self.color(dep) {
                Color::InProgress => return Some(self.close_cycle_at(dep)),
                Color::Done => {}
                Color::Unvisited => {
                    self.colors.insert(dep, Color::InProgress);
                    self.stack.push(dep);
                    frames.push((dep, 0));
                }
            }
        }

        None
    }

    fn close_cycle_at(&self, start: &str) -> CyclePath {
        let from = self
            .stack
            .iter()
            .position(|k| *k == start)
            .unwrap_or(0);

        let mut path: Vec<String> = self.stack[from..].iter().map(|k| k.to_string()).collect();
        path.push(start.to_string());
        CyclePath(path)
    }
}

/// Find a cycle in a name -> dependency-names map.
pub(crate) fn find_cycle_in(adjacency: &BTreeMap<String, Vec<String>>) -> Option<CyclePath> {
    CycleSearch::new(adjacency).run()
}

/// Find a dependency cycle in `graph`, if there is one.
///
/// Runs in O(V + E) over a snapshot of the graph's edges.
pub fn find_cycle<U>(graph: &DependencyGraph<U>) -> Option<CyclePath> {
    find_cycle_in(&graph.adjacency())
}

/// Fail with [`StartOrderError::DependencyCycle`] if `graph` has a cycle.
pub fn check_acyclic<U>(graph: &DependencyGraph<U>) -> Result<()> {
    match find_cycle(graph) {
        Some(path) => {
            warn!(cycle = %path, "dependency graph contains a cycle");
            Err(StartOrderError::DependencyCycle(path))
        }
        None => Ok(()),
    }
}
