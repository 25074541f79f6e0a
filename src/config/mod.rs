// src/config/mod.rs

//! Configuration for assetpipe.
//!
//! Responsibilities:
//! - Resolve the build flags (mode, target selector, timings) (`flags.rs`).
//! - Define the TOML-backed project file model (`model.rs`).
//! - Load a project file from disk (`loader.rs`).
//! - Validate templates, patterns and directories (`validate.rs`).

pub mod flags;
pub mod loader;
pub mod model;
pub mod validate;

pub use flags::{BuildFlags, EnvFlags, FlagSource, LayeredFlags};
pub use loader::{load_and_validate, load_from_path, load_or_default, project_root};
pub use model::{
    ConfigFile, PathsSection, PostProcessStep, RawConfigFile, ScriptSection, ServeSection,
    StyleSection,
};
pub use validate::validate_config;
