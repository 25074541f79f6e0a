// src/types.rs

//! Small value types shared across the crate.

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

/// Operating mode, derived once at startup from the build flags.
///
/// - `Release`: one-shot build with the post-processing chain.
/// - `Watch`: initial build, then recompile on filesystem changes.
/// - `Serve`: `Watch` plus a live-reload notification after each successful
///   compile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildMode {
    Release,
    Watch,
    Serve,
}

impl BuildMode {
    /// True for the modes that keep the process alive and react to events.
    pub fn is_watching(self) -> bool {
        matches!(self, BuildMode::Watch | BuildMode::Serve)
    }

    /// Production post-processing is gated strictly on `Release`.
    pub fn post_process(self) -> bool {
        matches!(self, BuildMode::Release)
    }

    pub fn live_reload(self) -> bool {
        matches!(self, BuildMode::Serve)
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BuildMode::Release => "release",
            BuildMode::Watch => "watch",
            BuildMode::Serve => "serve",
        };
        f.write_str(s)
    }
}

/// The independent source-to-artifact compilation paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PipelineKind {
    Style,
    Script,
}

impl PipelineKind {
    pub const ALL: [PipelineKind; 2] = [PipelineKind::Style, PipelineKind::Script];

    pub fn name(self) -> &'static str {
        match self {
            PipelineKind::Style => "style",
            PipelineKind::Script => "script",
        }
    }
}

impl fmt::Display for PipelineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which pipeline(s) the orchestrator runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TargetSelector {
    #[default]
    All,
    StyleOnly,
    ScriptOnly,
}

impl TargetSelector {
    /// Parse a `BUILD_ONLY` value. Unknown values select every pipeline.
    pub fn from_flag(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("css") => TargetSelector::StyleOnly,
            Some("javascript") => TargetSelector::ScriptOnly,
            _ => TargetSelector::All,
        }
    }

    /// The closed mapping from selector to the pipelines it runs.
    pub fn pipelines(self) -> &'static [PipelineKind] {
        match self {
            TargetSelector::All => &PipelineKind::ALL,
            TargetSelector::StyleOnly => &[PipelineKind::Style],
            TargetSelector::ScriptOnly => &[PipelineKind::Script],
        }
    }

    pub fn includes(self, kind: PipelineKind) -> bool {
        self.pipelines().contains(&kind)
    }
}

/// Kind of a filesystem notification, after normalisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchEventKind {
    Add,
    Change,
    Unlink,
}

/// A single normalised filesystem notification for one path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    pub kind: WatchEventKind,
    pub path: PathBuf,
}

impl WatchEvent {
    pub fn new(kind: WatchEventKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }
}

/// Outcome of one pipeline invocation. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileResult {
    pub success: bool,
    pub produced_files: BTreeSet<PathBuf>,
}

impl CompileResult {
    pub fn succeeded(produced_files: BTreeSet<PathBuf>) -> Self {
        Self {
            success: true,
            produced_files,
        }
    }

    pub fn failed() -> Self {
        Self {
            success: false,
            produced_files: BTreeSet::new(),
        }
    }
}
