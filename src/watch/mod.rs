// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - Compiling each pipeline's direct/watch glob patterns.
//! - Wiring up a cross-platform filesystem watcher (`notify`) per pipeline.
//! - Translating notifications into compile or artifact-removal jobs,
//!   skipping changes that leave file content untouched.
//!
//! It never runs a pipeline itself; jobs go to the pipeline's worker queue.

pub mod cache;
pub mod event_handler;
pub mod patterns;
pub mod watcher;

pub use cache::{compute_file_hash, ContentCache};
pub use event_handler::{route, translate, EventRouter};
pub use patterns::{build_globset, collect_matching_files, glob_base, SourcePatterns};
pub use watcher::{start_watching, stop_watching, WatchHandle};
