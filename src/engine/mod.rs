// src/engine/mod.rs

//! Orchestration engine for assetpipe.
//!
//! - [`orchestrator`] picks the pipelines for the target selector, runs them
//!   once (`Release`) or starts their workers and watchers (`Watch`,
//!   `Serve`), and is the outermost place errors are caught and logged.
//! - [`reload`] is the `Serve`-mode notification hook.

pub mod orchestrator;
pub mod reload;

pub use orchestrator::{Orchestrator, PipelineSet, RunSummary, WatchSession};
pub use reload::ReloadHook;
