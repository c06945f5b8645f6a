// src/errors.rs

//! Crate-wide error type and result alias.

use std::time::Duration;

use thiserror::Error;

use crate::dag::CyclePath;

#[derive(Error, Debug)]
pub enum StartOrderError {
    #[error("could not find unit '{0}'")]
    UnitNotFound(String),

    #[error("unit '{0}' is defined more than once")]
    DuplicateUnit(String),

    #[error("dependency cycle found: {0}")]
    DependencyCycle(CyclePath),

    #[error("failed to start unit '{unit}': {source}")]
    Activation {
        unit: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("run was cancelled before every unit was started")]
    Cancelled,

    #[error("run did not finish within {0:?}")]
    DeadlineExceeded(Duration),

    #[error("start task panicked: {0}")]
    TaskPanicked(#[from] tokio::task::JoinError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StartOrderError {
    /// Wrap a failed start action for `unit`.
    pub fn activation(unit: impl Into<String>, source: anyhow::Error) -> Self {
        StartOrderError::Activation {
            unit: unit.into(),
            source: source.into(),
        }
    }

    /// Name of the unit this error is about, if any.
    pub fn unit(&self) -> Option<&str> {
        match self {
            StartOrderError::UnitNotFound(name)
            | StartOrderError::DuplicateUnit(name)
            | StartOrderError::Activation { unit: name, .. } => Some(name),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, StartOrderError>;
