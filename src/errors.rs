// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SitedagError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Unknown task or pipeline: {0}")]
    UnknownTarget(String),

    #[error("Pipeline conflict: {0}")]
    PipelineConflict(String),

    #[error("Pipeline '{pipeline}' failed in stage {stage}: {tasks}")]
    PipelineFailed {
        pipeline: String,
        stage: usize,
        tasks: String,
    },

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, SitedagError>;
