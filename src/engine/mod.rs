// src/engine/mod.rs

//! Concurrent startup engine.
//!
//! [`runner`] walks a validated [`DependencyGraph`](crate::dag::DependencyGraph)
//! from its leaves upwards, starting each unit as soon as all of its
//! dependencies have started, and stops launching on the first failure.

use std::time::Duration;

pub mod runner;

pub use runner::{in_dependency_order, Runner};

/// Options for a single run.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Deadline for the whole run. When it passes, no further unit is
    /// launched and in-flight start actions see their token cancelled.
    pub timeout: Option<Duration>,
}
