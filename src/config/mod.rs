// src/config/mod.rs

//! Configuration loading and validation for the `startorder` binary.
//!
//! The scheduling core never reads configuration; this module only turns a
//! TOML file into a validated list of units.
//!
//! - [`model`] defines the TOML-backed data model.
//! - [`loader`] reads a config file from disk.
//! - [`validate`] checks it (dependencies, cycles, timeout).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, DEFAULT_CONFIG_FILE};
pub use model::{ConfigFile, ConfigSection, RawConfigFile, UnitConfig};
pub use validate::parse_duration;
