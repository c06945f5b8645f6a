#![allow(dead_code)]

use std::collections::BTreeMap;

use startorder::config::{ConfigFile, ConfigSection, RawConfigFile, UnitConfig};
use startorder::types::UnitSpec;

/// Build unit definitions from `(name, dependencies)` pairs.
///
/// ```ignore
/// let units = units(&[("db", &[]), ("api", &["db"])]);
/// ```
pub fn units(spec: &[(&str, &[&str])]) -> Vec<UnitSpec> {
    spec.iter()
        .map(|(name, deps)| UnitSpec::new(*name).depends_on_all(deps.iter().copied()))
        .collect()
}

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                config: ConfigSection::default(),
                unit: BTreeMap::new(),
            },
        }
    }

    pub fn with_unit(mut self, name: &str, unit: UnitConfig) -> Self {
        self.config.unit.insert(name.to_string(), unit);
        self
    }

    pub fn with_timeout(mut self, timeout: &str) -> Self {
        self.config.config.timeout = Some(timeout.to_string());
        self
    }

    pub fn build_raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `UnitConfig`.
pub struct UnitConfigBuilder {
    unit: UnitConfig,
}

impl UnitConfigBuilder {
    pub fn new(cmd: &str) -> Self {
        Self {
            unit: UnitConfig {
                name: String::new(),
                cmd: cmd.to_string(),
                depends_on: vec![],
            },
        }
    }

    pub fn depends_on(mut self, dep: &str) -> Self {
        self.unit.depends_on.push(dep.to_string());
        self
    }

    pub fn build(self) -> UnitConfig {
        self.unit
    }
}
