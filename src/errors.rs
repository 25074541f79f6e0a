// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

use crate::types::PipelineKind;

#[derive(Error, Debug)]
pub enum AssetpipeError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// An external compiler or post-processor exited with a non-zero status.
    #[error("{pipeline} pipeline: {step} exited with status {code}")]
    CompileFailed {
        pipeline: PipelineKind,
        step: String,
        code: i32,
    },

    /// The script transform failed. Logged, never propagated past the pipeline.
    #[error("{pipeline} pipeline: transform failed: {reason}")]
    TransformFailed {
        pipeline: PipelineKind,
        reason: String,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, AssetpipeError>;
