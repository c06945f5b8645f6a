// src/types.rs

//! Shared vocabulary types: what a unit is, and the status a unit can be in.

use std::fmt;

/// A named item to be started, with zero or more declared dependencies.
///
/// Dependencies are referenced by name and resolved against the other units
/// when the graph is built.
pub trait Unit: Send + Sync + 'static {
    /// Unique name of this unit.
    fn name(&self) -> &str;

    /// Names of the units that must be started before this one.
    fn dependencies(&self) -> &[String];
}

/// Per-unit status tracked by the dependency graph.
///
/// `Stopped` is the initial state; `Started` is terminal for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UnitStatus {
    #[default]
    Stopped,
    Started,
}

impl fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitStatus::Stopped => f.write_str("stopped"),
            UnitStatus::Started => f.write_str("started"),
        }
    }
}

/// Plain in-memory unit definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitSpec {
    pub name: String,
    pub depends_on: Vec<String>,
}

impl UnitSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            depends_on: Vec::new(),
        }
    }

    /// Add a dependency on `dep`.
    pub fn depends_on(mut self, dep: impl Into<String>) -> Self {
        self.depends_on.push(dep.into());
        self
    }

    /// Add dependencies on every name in `deps`.
    pub fn depends_on_all(mut self, deps: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.depends_on.extend(deps.into_iter().map(Into::into));
        self
    }
}

impl Unit for UnitSpec {
    fn name(&self) -> &str {
        &self.name
    }

    fn dependencies(&self) -> &[String] {
        &self.depends_on
    }
}
