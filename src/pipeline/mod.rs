// src/pipeline/mod.rs

//! Source-to-artifact pipelines.
//!
//! - [`style`] compiles LESS sources through a staging directory and, in
//!   `Release`, the post-processing chain.
//! - [`script`] keeps the script bundling shape with an inert transform.
//! - [`staging`] owns the scoped staging directory.
//! - [`worker`] serialises invocations per pipeline in watch modes and holds
//!   the invocation boundary where errors are logged and contained.

pub mod script;
pub mod staging;
pub mod style;
pub mod worker;

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;

use anyhow::anyhow;
use tracing::debug;

use crate::config::validate::check_staging_dir;
use crate::config::ConfigFile;
use crate::errors::Result;
use crate::fs::FileSystem;
use crate::types::{BuildMode, CompileResult, PipelineKind};
use crate::watch::patterns::{relative_to, SourcePatterns};

pub use script::{InertBundler, ScriptPipeline, ScriptTransform};
pub use staging::StagingDir;
pub use style::{StylePipeline, StyleTools};
pub use worker::{invoke, spawn_worker, PipelineJob, PipelineWorker, WorkerOptions};

pub type PipelineFuture<'a> = Pin<Box<dyn Future<Output = Result<CompileResult>> + Send + 'a>>;

/// One independent compilation path.
pub trait Pipeline: Send + Sync {
    fn spec(&self) -> &PipelineSpec;

    fn kind(&self) -> PipelineKind {
        self.spec().kind
    }

    /// Compile `changed` if given (when the pipeline supports narrowing),
    /// else the whole direct source set.
    fn compile<'a>(&'a self, changed: Option<&'a Path>) -> PipelineFuture<'a>;
}

/// Static description of a pipeline. Constant after construction.
///
/// All paths are already resolved against the project root.
#[derive(Debug, Clone)]
pub struct PipelineSpec {
    pub kind: PipelineKind,
    pub root: PathBuf,
    pub patterns: SourcePatterns,
    pub staging_dir: Option<PathBuf>,
    pub output_dir: PathBuf,
    pub post_process: bool,
    pub artifact_extension: String,
}

impl PipelineSpec {
    pub fn for_kind(
        kind: PipelineKind,
        cfg: &ConfigFile,
        root: &Path,
        mode: BuildMode,
    ) -> Result<Self> {
        let output_dir = root.join(&cfg.paths().output);
        let spec = match kind {
            PipelineKind::Style => {
                let style = cfg.style();
                check_staging_dir(root, &style.staging, &cfg.paths().output)?;
                Self {
                    kind,
                    root: root.to_path_buf(),
                    patterns: SourcePatterns::new(&style.sources, &style.watch)?,
                    staging_dir: Some(root.join(&style.staging)),
                    output_dir,
                    post_process: mode.post_process(),
                    artifact_extension: style.artifact_extension.clone(),
                }
            }
            PipelineKind::Script => {
                let script = cfg.script();
                Self {
                    kind,
                    root: root.to_path_buf(),
                    patterns: SourcePatterns::new(&script.sources, &script.watch)?,
                    staging_dir: None,
                    output_dir,
                    post_process: false,
                    artifact_extension: script.artifact_extension.clone(),
                }
            }
        };
        Ok(spec)
    }

    /// `path` relative to the project root, forward slashes.
    pub fn relative(&self, path: &Path) -> Option<String> {
        relative_to(&self.root, path)
    }

    /// True if `path` is one of the flat sources that yields an artifact.
    pub fn is_direct_source(&self, path: &Path) -> bool {
        self.relative(path)
            .is_some_and(|rel| self.patterns.is_direct(&rel))
    }
}

/// Run blocking filesystem work off the async threads.
pub(crate) async fn run_blocking<T, F>(f: F) -> anyhow::Result<T>
where
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| anyhow!("blocking filesystem task failed: {e}"))?
}

/// Sources one invocation compiles.
///
/// A changed direct source that still exists narrows the compile to that
/// file. Anything else (a nested partial, a vanished file, no file) selects
/// every direct source, since importers of a partial are unknown.
pub(crate) async fn select_sources(
    spec: &PipelineSpec,
    fs: &Arc<dyn FileSystem>,
    changed: Option<&Path>,
) -> anyhow::Result<Vec<PathBuf>> {
    let spec = spec.clone();
    let fs = Arc::clone(fs);
    let changed = changed.map(Path::to_path_buf);

    run_blocking(move || {
        if let Some(path) = changed {
            if spec.is_direct_source(&path) && fs.is_file(&path) {
                return Ok(vec![path]);
            }
            debug!(pipeline = %spec.kind, ?path, "not a direct source; selecting full set");
        }
        spec.patterns.direct_sources(fs.as_ref(), &spec.root)
    })
    .await
}
