//! Error types for CA workspace setup.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SetupError>;

#[derive(Debug, Error)]
pub enum SetupError {
    #[error(
        "{} already exists. If you wish to set it up again, please remove this file and re-run the command.",
        .0.display()
    )]
    AlreadyConfigured(PathBuf),

    #[error(
        "{} does not exist. You need to run `selfcertbot setup` before use.",
        .0.display()
    )]
    NotConfigured(PathBuf),

    #[error("Setup cancelled")]
    Cancelled,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Command execution failed: {0}")]
    CommandExecution(String),

    #[error("Missing dependency: {0}")]
    MissingDependency(String),

    #[error("Could not determine home directory (HOME not set)")]
    HomeDirectory,

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}
