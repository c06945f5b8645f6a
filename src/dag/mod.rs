// src/dag/mod.rs

//! Dependency graph of units.
//!
//! - [`graph`] holds the units, their edges and per-unit status.
//! - [`cycle`] validates that the graph is acyclic before anything runs.
//! - [`frontier`] decides, once per unit, when its dependencies are all
//!   started.

pub mod cycle;
pub mod frontier;
pub mod graph;

pub use cycle::{check_acyclic, find_cycle, CyclePath};
pub use frontier::Frontier;
pub use graph::{DependencyGraph, Vertex};
