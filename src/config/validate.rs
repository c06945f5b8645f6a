// src/config/validate.rs

use std::time::Duration;

use crate::config::model::{ConfigFile, RawConfigFile, UnitConfig};
use crate::dag::{check_acyclic, DependencyGraph};
use crate::errors::{Result, StartOrderError};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = StartOrderError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        ensure_has_units(&raw)?;
        let timeout = validate_global_config(&raw)?;

        let units: Vec<UnitConfig> = raw
            .unit
            .into_iter()
            .map(|(name, mut unit)| {
                unit.name = name;
                unit
            })
            .collect();

        validate_commands(&units)?;
        validate_unit_dependencies(&units)?;
        validate_dag(&units)?;

        Ok(ConfigFile::new_unchecked(timeout, units))
    }
}

fn ensure_has_units(cfg: &RawConfigFile) -> Result<()> {
    if cfg.unit.is_empty() {
        return Err(StartOrderError::ConfigError(
            "config must contain at least one [unit.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<Option<Duration>> {
    cfg.config
        .timeout
        .as_deref()
        .map(|s| {
            parse_duration(s).map_err(|e| {
                StartOrderError::ConfigError(format!("invalid [config].timeout: {e}"))
            })
        })
        .transpose()
}

fn validate_commands(units: &[UnitConfig]) -> Result<()> {
    for unit in units {
        if unit.cmd.trim().is_empty() {
            return Err(StartOrderError::ConfigError(format!(
                "unit '{}' has an empty `cmd`",
                unit.name
            )));
        }
    }
    Ok(())
}

fn validate_unit_dependencies(units: &[UnitConfig]) -> Result<()> {
    for unit in units {
        for dep in &unit.depends_on {
            if !units.iter().any(|u| &u.name == dep) {
                return Err(StartOrderError::ConfigError(format!(
                    "unit '{}' has unknown dependency '{}' in `depends_on`",
                    unit.name, dep
                )));
            }
        }
    }
    Ok(())
}

fn validate_dag(units: &[UnitConfig]) -> Result<()> {
    let graph = DependencyGraph::from_units(units.iter().cloned())?;
    check_acyclic(&graph)
}

/// Parse a duration such as `"250ms"`, `"30s"`, `"5m"` or `"1h"`.
///
/// Values that do not fit in a `Duration` of whole milliseconds are rejected.
pub fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    let s = s.trim();
    let split = s
        .find(|c: char| !c.is_ascii_digit())
        .ok_or_else(|| format!("duration '{s}' needs a unit suffix (ms, s, m or h)"))?;
    let (digits, suffix) = s.split_at(split);

    let amount: u64 = digits
        .parse()
        .map_err(|_| format!("duration '{s}' does not start with a whole number"))?;

    let millis_per = match suffix.trim().to_ascii_lowercase().as_str() {
        "ms" => 1,
        "s" => 1_000,
        "m" => 60_000,
        "h" => 3_600_000,
        other => return Err(format!("unknown duration suffix '{other}' in '{s}'")),
    };

    amount
        .checked_mul(millis_per)
        .map(Duration::from_millis)
        .ok_or_else(|| format!("duration '{s}' is too large"))
}
