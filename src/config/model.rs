// src/config/model.rs

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use crate::dag::DependencyGraph;
use crate::errors::Result;
use crate::types::Unit;

/// Configuration exactly as read from a TOML file, before validation.
///
/// ```toml
/// [config]
/// timeout = "30s"
///
/// [unit.db]
/// cmd = "docker start db"
///
/// [unit.api]
/// cmd = "docker start api"
/// depends_on = ["db"]
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    /// Run-wide settings from `[config]`.
    #[serde(default)]
    pub config: ConfigSection,

    /// All units from `[unit.<name>]`, keyed by unit name.
    #[serde(default)]
    pub unit: BTreeMap<String, UnitConfig>,
}

/// `[config]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigSection {
    /// Deadline for the whole run, e.g. `"500ms"`, `"30s"`, `"2m"`.
    #[serde(default)]
    pub timeout: Option<String>,
}

/// `[unit.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct UnitConfig {
    /// Filled in from the table key during validation.
    #[serde(skip)]
    pub name: String,

    /// Shell command that starts the unit. It must exit successfully once
    /// the unit is up.
    pub cmd: String,

    /// Units that must be started before this one.
    #[serde(default)]
    pub depends_on: Vec<String>,
}

impl Unit for UnitConfig {
    fn name(&self) -> &str {
        &self.name
    }

    fn dependencies(&self) -> &[String] {
        &self.depends_on
    }
}

/// Validated configuration.
///
/// Only obtainable through `TryFrom<RawConfigFile>`, so holding one means
/// every dependency exists and the units form a DAG.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub timeout: Option<Duration>,
    pub units: Vec<UnitConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(timeout: Option<Duration>, units: Vec<UnitConfig>) -> Self {
        Self { timeout, units }
    }

    pub fn unit(&self, name: &str) -> Option<&UnitConfig> {
        self.units.iter().find(|u| u.name == name)
    }

    /// Build a fresh dependency graph for one run.
    pub fn graph(&self) -> Result<DependencyGraph<UnitConfig>> {
        DependencyGraph::from_units(self.units.iter().cloned())
    }
}
