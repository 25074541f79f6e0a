// src/pipeline/style.rs

//! Style pipeline: LESS sources → staging → (post-process | copy) → output.
//!
//! Per invocation:
//! 1. acquire a fresh staging directory;
//! 2. run the compiler for every selected source into staging, all of which
//!    must succeed before anything reaches the output directory;
//! 3. `Release`: run the post-processing chain per staged file, every step
//!    writing inside staging;
//! 4. once all files are done, copy the final CSS into the output
//!    directory (verbatim compiler output outside `Release`);
//! 5. remove staging, whether or not the earlier steps succeeded.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::{PostProcessStep, StyleSection};
use crate::errors::{AssetpipeError, Result};
use crate::exec::{render_template, CommandInvocation, CommandOutcome, CommandRunner};
use crate::fs::FileSystem;
use crate::output::{artifact_name, OutputDir};
use crate::types::{CompileResult, PipelineKind};

use super::{run_blocking, select_sources, Pipeline, PipelineFuture, PipelineSpec, StagingDir};

/// Command templates for the external style tools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleTools {
    pub compiler: String,
    pub post_process: Vec<PostProcessStep>,
}

impl StyleTools {
    pub fn from_config(section: &StyleSection) -> Self {
        Self {
            compiler: section.compiler.clone(),
            post_process: section.post_process.clone(),
        }
    }
}

pub struct StylePipeline {
    spec: PipelineSpec,
    tools: StyleTools,
    fs: Arc<dyn FileSystem>,
    runner: Arc<dyn CommandRunner>,
    output: OutputDir,
}

impl StylePipeline {
    pub fn new(
        spec: PipelineSpec,
        tools: StyleTools,
        fs: Arc<dyn FileSystem>,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        let output = OutputDir::new(spec.output_dir.clone(), Arc::clone(&fs));
        Self {
            spec,
            tools,
            fs,
            runner,
            output,
        }
    }

    async fn compile_inner(&self, changed: Option<&Path>) -> Result<CompileResult> {
        let output = self.output.clone();
        run_blocking(move || output.ensure()).await?;

        let sources = select_sources(&self.spec, &self.fs, changed).await?;
        if sources.is_empty() {
            info!(pipeline = %PipelineKind::Style, "no style sources matched; nothing to compile");
            return Ok(CompileResult::succeeded(BTreeSet::new()));
        }

        let staging_path = self.spec.staging_dir.clone().ok_or_else(|| {
            AssetpipeError::ConfigError("style pipeline requires a staging directory".to_string())
        })?;
        let fs = Arc::clone(&self.fs);
        let staging = run_blocking(move || StagingDir::acquire(fs, staging_path)).await?;

        let result = self.compile_staged(staging.path(), &sources).await;

        if let Err(err) = run_blocking(move || staging.release()).await {
            warn!(
                pipeline = %PipelineKind::Style,
                error = %err,
                "failed to remove staging directory"
            );
        }

        result
    }

    async fn compile_staged(&self, staging: &Path, sources: &[PathBuf]) -> Result<CompileResult> {
        let ext = &self.spec.artifact_extension;

        let mut staged = Vec::with_capacity(sources.len());
        for source in sources {
            let name = artifact_name(source, ext).ok_or_else(|| {
                AssetpipeError::ConfigError(format!("cannot derive artifact name from {source:?}"))
            })?;
            let target = staging.join(&name);
            self.run_step("compile", &self.tools.compiler, source, &target)
                .await?;
            staged.push((name, target));
        }
        debug!(count = staged.len(), "style sources compiled into staging");

        let chain = self.spec.post_process && !self.tools.post_process.is_empty();
        if self.spec.post_process && !chain {
            warn!("release build without post-process steps; copying compiled CSS as-is");
        }

        // Nothing reaches the output directory until every file has made it
        // through the whole chain.
        let mut finals = Vec::with_capacity(staged.len());
        for (name, staged_file) in staged {
            let last = if chain {
                self.post_process(staging, &name, staged_file).await?
            } else {
                staged_file
            };
            finals.push((last, self.output.path().join(&name)));
        }

        let mut produced = BTreeSet::new();
        for (from, dest) in finals {
            let fs = Arc::clone(&self.fs);
            let to = dest.clone();
            run_blocking(move || fs.copy(&from, &to)).await?;
            produced.insert(dest);
        }

        Ok(CompileResult::succeeded(produced))
    }

    /// Run the chain for one staged file. Every step writes inside staging;
    /// returns the last step's output.
    async fn post_process(&self, staging: &Path, name: &str, staged_file: PathBuf) -> Result<PathBuf> {
        let mut input = staged_file;
        for (i, step) in self.tools.post_process.iter().enumerate() {
            let output = staging.join(format!("{i}-{}-{name}", step.name));
            self.run_step(&step.name, &step.cmd, &input, &output).await?;
            input = output;
        }
        Ok(input)
    }

    async fn run_step(&self, label: &str, template: &str, input: &Path, output: &Path) -> Result<()> {
        let invocation = CommandInvocation {
            label: label.to_string(),
            cmd: render_template(template, input, output, &self.spec.root),
            cwd: self.spec.root.clone(),
        };

        match self.runner.run(&invocation).await? {
            CommandOutcome::Success => Ok(()),
            CommandOutcome::Failed(code) => Err(AssetpipeError::CompileFailed {
                pipeline: PipelineKind::Style,
                step: label.to_string(),
                code,
            }),
        }
    }
}

impl Pipeline for StylePipeline {
    fn spec(&self) -> &PipelineSpec {
        &self.spec
    }

    fn compile<'a>(&'a self, changed: Option<&'a Path>) -> PipelineFuture<'a> {
        Box::pin(self.compile_inner(changed))
    }
}
