// src/pipeline/script.rs

//! Script pipeline.
//!
//! The bundling transform is inert: sources are selected exactly like the
//! style pipeline selects them, and handed to a [`ScriptTransform`] that
//! currently produces nothing. A failing transform never fails the build;
//! it is reported as a warning and a failed `CompileResult`.

use std::collections::BTreeSet;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::errors::{AssetpipeError, Result};
use crate::fs::FileSystem;
use crate::output::OutputDir;
use crate::types::{CompileResult, PipelineKind};

use super::{run_blocking, select_sources, Pipeline, PipelineFuture, PipelineSpec};

pub type TransformFuture<'a> =
    Pin<Box<dyn Future<Output = anyhow::Result<BTreeSet<PathBuf>>> + Send + 'a>>;

/// Bundles script sources into the output directory, returning the
/// artifacts it wrote.
pub trait ScriptTransform: Send + Sync {
    fn name(&self) -> &str;

    fn bundle<'a>(&'a self, sources: &'a [PathBuf], output_dir: &'a Path) -> TransformFuture<'a>;
}

/// Placeholder transform: accepts every source set and writes nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct InertBundler;

impl ScriptTransform for InertBundler {
    fn name(&self) -> &str {
        "inert"
    }

    fn bundle<'a>(&'a self, sources: &'a [PathBuf], output_dir: &'a Path) -> TransformFuture<'a> {
        Box::pin(async move {
            debug!(
                sources = sources.len(),
                ?output_dir,
                "script bundling is inert; no artifacts written"
            );
            Ok(BTreeSet::new())
        })
    }
}

pub struct ScriptPipeline {
    spec: PipelineSpec,
    fs: Arc<dyn FileSystem>,
    output: OutputDir,
    transform: Arc<dyn ScriptTransform>,
}

impl ScriptPipeline {
    pub fn new(
        spec: PipelineSpec,
        fs: Arc<dyn FileSystem>,
        transform: Arc<dyn ScriptTransform>,
    ) -> Self {
        let output = OutputDir::new(spec.output_dir.clone(), Arc::clone(&fs));
        Self {
            spec,
            fs,
            output,
            transform,
        }
    }

    async fn compile_inner(&self, changed: Option<&Path>) -> Result<CompileResult> {
        let output = self.output.clone();
        run_blocking(move || output.ensure()).await?;

        let sources = select_sources(&self.spec, &self.fs, changed).await?;
        let produced = self
            .transform
            .bundle(&sources, self.output.path())
            .await
            .map_err(|err| AssetpipeError::TransformFailed {
                pipeline: PipelineKind::Script,
                reason: format!("{err:#}"),
            })?;

        Ok(CompileResult::succeeded(produced))
    }
}

impl Pipeline for ScriptPipeline {
    fn spec(&self) -> &PipelineSpec {
        &self.spec
    }

    fn compile<'a>(&'a self, changed: Option<&'a Path>) -> PipelineFuture<'a> {
        Box::pin(async move {
            match self.compile_inner(changed).await {
                Ok(result) => Ok(result),
                Err(err) => {
                    warn!(
                        pipeline = %PipelineKind::Script,
                        transform = self.transform.name(),
                        error = %err,
                        "script pipeline is inert; failure contained to this pipeline"
                    );
                    Ok(CompileResult::failed())
                }
            }
        })
    }
}
