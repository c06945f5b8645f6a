// src/dag/graph.rs

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard};

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use tracing::{debug, trace};

use crate::errors::{Result, StartOrderError};
use crate::types::{Unit, UnitStatus};

/// Graph representation of a single unit.
///
/// `dependencies` are the units this one waits on; `dependents` are the units
/// waiting on this one. Both sides of every edge are always recorded.
#[derive(Debug)]
pub struct Vertex<U> {
    pub key: String,
    pub unit: Arc<U>,
    pub status: UnitStatus,
    pub dependencies: BTreeSet<String>,
    pub dependents: BTreeSet<String>,
}

impl<U> Vertex<U> {
    fn new(key: String, unit: Arc<U>) -> Self {
        Self {
            key,
            unit,
            status: UnitStatus::Stopped,
            dependencies: BTreeSet::new(),
            dependents: BTreeSet::new(),
        }
    }
}

/// Dependency graph of units, keyed by unit name.
///
/// Every query and mutation goes through a single lock, and every query
/// returns an owned snapshot. Vertices are kept in name order so that
/// traversal order (and therefore cycle traces) is deterministic.
#[derive(Debug)]
pub struct DependencyGraph<U> {
    vertices: Mutex<BTreeMap<String, Vertex<U>>>,
}

impl<U> Default for DependencyGraph<U> {
    fn default() -> Self {
        Self {
            vertices: Mutex::new(BTreeMap::new()),
        }
    }
}

impl<U: Unit> DependencyGraph<U> {
    /// Build a graph from a full list of unit definitions.
    ///
    /// All vertices are inserted first, then one edge per declared
    /// dependency. A dependency on a name absent from `units` fails with
    /// [`StartOrderError::UnitNotFound`]. Acyclicity is *not* checked here;
    /// see [`crate::dag::check_acyclic`].
    pub fn from_units(units: impl IntoIterator<Item = U>) -> Result<Self> {
        let graph = Self::default();
        let units: Vec<Arc<U>> = units.into_iter().map(Arc::new).collect();

        for unit in &units {
            graph.add_vertex(unit.name(), Arc::clone(unit))?;
        }

        for unit in &units {
            for dep in unit.dependencies() {
                graph.add_edge(unit.name(), dep)?;
            }
        }

        debug!(units = units.len(), "dependency graph built");
        Ok(graph)
    }
}

impl<U> DependencyGraph<U> {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, Vertex<U>>> {
        // Critical sections never panic half-way through a mutation, so a
        // poisoned map is still consistent.
        self.vertices
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Insert a new vertex with status `Stopped`.
    ///
    /// Fails with [`StartOrderError::DuplicateUnit`] if `name` is already
    /// present; an existing vertex is never overwritten.
    pub fn add_vertex(&self, name: impl Into<String>, unit: Arc<U>) -> Result<()> {
        let name = name.into();
        let mut vertices = self.lock();

        if vertices.contains_key(&name) {
            return Err(StartOrderError::DuplicateUnit(name));
        }

        trace!(unit = %name, "adding vertex");
        vertices.insert(name.clone(), Vertex::new(name, unit));
        Ok(())
    }

    /// Record that `source` depends on `destination`.
    ///
    /// Re-adding an existing edge is a no-op.
    pub fn add_edge(&self, source: &str, destination: &str) -> Result<()> {
        let mut vertices = self.lock();

        if !vertices.contains_key(source) {
            return Err(StartOrderError::UnitNotFound(source.to_string()));
        }
        if !vertices.contains_key(destination) {
            return Err(StartOrderError::UnitNotFound(destination.to_string()));
        }

        if let Some(src) = vertices.get_mut(source) {
            if !src.dependencies.insert(destination.to_string()) {
                return Ok(());
            }
        }
        if let Some(dst) = vertices.get_mut(destination) {
            dst.dependents.insert(source.to_string());
        }

        trace!(unit = %source, dependency = %destination, "adding edge");
        Ok(())
    }

    /// Names of all units without dependencies: the initial frontier.
    pub fn leaves(&self) -> Vec<String> {
        self.lock()
            .values()
            .filter(|v| v.dependencies.is_empty())
            .map(|v| v.key.clone())
            .collect()
    }

    /// Units that wait on `name`.
    pub fn dependents_of(&self, name: &str) -> Result<BTreeSet<String>> {
        self.lock()
            .get(name)
            .map(|v| v.dependents.clone())
            .ok_or_else(|| StartOrderError::UnitNotFound(name.to_string()))
    }

    /// Units that `name` waits on.
    pub fn dependencies_of(&self, name: &str) -> Result<BTreeSet<String>> {
        self.lock()
            .get(name)
            .map(|v| v.dependencies.clone())
            .ok_or_else(|| StartOrderError::UnitNotFound(name.to_string()))
    }

    /// Dependencies of `name` that have not reached `Started` yet.
    pub fn unsatisfied_dependencies(&self, name: &str) -> Result<BTreeSet<String>> {
        let vertices = self.lock();
        let vertex = vertices
            .get(name)
            .ok_or_else(|| StartOrderError::UnitNotFound(name.to_string()))?;

        Ok(vertex
            .dependencies
            .iter()
            .filter(|dep| {
                vertices
                    .get(dep.as_str())
                    .is_none_or(|d| d.status != UnitStatus::Started)
            })
            .cloned()
            .collect())
    }

    pub fn set_status(&self, name: &str, status: UnitStatus) -> Result<()> {
        let mut vertices = self.lock();
        let vertex = vertices
            .get_mut(name)
            .ok_or_else(|| StartOrderError::UnitNotFound(name.to_string()))?;

        debug!(unit = %name, from = %vertex.status, to = %status, "status change");
        vertex.status = status;
        Ok(())
    }

    pub fn status_of(&self, name: &str) -> Option<UnitStatus> {
        self.lock().get(name).map(|v| v.status)
    }

    /// Snapshot of every unit's status, in name order.
    pub fn statuses(&self) -> BTreeMap<String, UnitStatus> {
        self.lock()
            .values()
            .map(|v| (v.key.clone(), v.status))
            .collect()
    }

    /// The unit definition stored under `name`.
    pub fn unit(&self, name: &str) -> Option<Arc<U>> {
        self.lock().get(name).map(|v| Arc::clone(&v.unit))
    }

    pub fn names(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lock().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Snapshot of the dependency lists of every vertex.
    pub(crate) fn adjacency(&self) -> BTreeMap<String, Vec<String>> {
        self.lock()
            .values()
            .map(|v| (v.key.clone(), v.dependencies.iter().cloned().collect()))
            .collect()
    }

    /// One valid sequential start order (dependencies first).
    ///
    /// Only used for diagnostics such as dry runs; the runner itself never
    /// serializes units. A cyclic graph yields
    /// [`StartOrderError::DependencyCycle`] with the offending path.
    pub fn topological_order(&self) -> Result<Vec<String>> {
        let adjacency = self.adjacency();

        // Edge direction: dependency -> dependent.
        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
        for name in adjacency.keys() {
            graph.add_node(name.as_str());
        }
        for (name, deps) in &adjacency {
            for dep in deps {
                graph.add_edge(dep.as_str(), name.as_str(), ());
            }
        }

        match toposort(&graph, None) {
            Ok(order) => Ok(order.into_iter().map(str::to_string).collect()),
            Err(cycle) => {
                debug!(unit = %cycle.node_id(), "topological sort hit a cycle");
                match crate::dag::cycle::find_cycle_in(&adjacency) {
                    Some(path) => Err(StartOrderError::DependencyCycle(path)),
                    None => Err(StartOrderError::UnitNotFound(cycle.node_id().to_string())),
                }
            }
        }
    }
}
