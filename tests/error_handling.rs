// tests/error_handling.rs

mod common;
use crate::common::builders::{ConfigFileBuilder, UnitConfigBuilder};

use std::io::Write;
use std::time::Duration;

use tempfile::NamedTempFile;
use startorder::config::{load_and_validate, ConfigFile};
use startorder::errors::StartOrderError;

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

#[test]
fn test_dependency_cycle_returns_structured_error() {
    let file = config_file(
        r#"
[unit.A]
cmd = "echo A"
depends_on = ["B"]

[unit.B]
cmd = "echo B"
depends_on = ["A"]
"#,
    );

    match load_and_validate(file.path()) {
        Err(StartOrderError::DependencyCycle(path)) => {
            assert_eq!(path.to_string(), "A -> B -> A");
        }
        Err(e) => panic!("Expected DependencyCycle error, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_unknown_dependency_returns_config_error() {
    let file = config_file(
        r#"
[unit.A]
cmd = "echo A"
depends_on = ["NonExistent"]
"#,
    );

    match load_and_validate(file.path()) {
        Err(StartOrderError::ConfigError(msg)) => {
            assert!(msg.contains("unknown dependency"));
            assert!(msg.contains("NonExistent"));
        }
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_empty_config_is_rejected() {
    let file = config_file("[config]\ntimeout = \"5s\"\n");
    assert!(matches!(
        load_and_validate(file.path()),
        Err(StartOrderError::ConfigError(msg)) if msg.contains("at least one")
    ));
}

#[test]
fn test_bad_timeout_is_rejected() {
    let raw = ConfigFileBuilder::new()
        .with_timeout("soon")
        .with_unit("a", UnitConfigBuilder::new("true").build())
        .build_raw();

    assert!(matches!(
        ConfigFile::try_from(raw),
        Err(StartOrderError::ConfigError(msg)) if msg.contains("timeout")
    ));
}

#[test]
fn test_empty_command_is_rejected() {
    let raw = ConfigFileBuilder::new()
        .with_unit("a", UnitConfigBuilder::new("  ").build())
        .build_raw();

    assert!(matches!(
        ConfigFile::try_from(raw),
        Err(StartOrderError::ConfigError(msg)) if msg.contains("empty `cmd`")
    ));
}

#[test]
fn test_malformed_toml_returns_toml_error() {
    let file = config_file("[unit.a\ncmd = ");
    assert!(matches!(
        load_and_validate(file.path()),
        Err(StartOrderError::TomlError(_))
    ));
}

#[test]
fn test_missing_file_returns_io_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        load_and_validate(dir.path().join("missing.toml")),
        Err(StartOrderError::IoError(_))
    ));
}

#[test]
fn test_valid_config_builds_graph() {
    let cfg = ConfigFileBuilder::new()
        .with_timeout("2m")
        .with_unit("db", UnitConfigBuilder::new("true").build())
        .with_unit("api", UnitConfigBuilder::new("true").depends_on("db").build())
        .build();

    assert_eq!(cfg.timeout, Some(Duration::from_secs(120)));

    let graph = cfg.graph().unwrap();
    assert_eq!(graph.leaves(), vec!["db".to_string()]);
    assert_eq!(graph.topological_order().unwrap(), vec!["db", "api"]);
}
