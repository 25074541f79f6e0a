// src/engine/orchestrator.rs

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::config::BuildFlags;
use crate::errors::Result;
use crate::fs::FileSystem;
use crate::output::OutputDir;
use crate::pipeline::{
    invoke, run_blocking, spawn_worker, Pipeline, PipelineJob, PipelineWorker, WorkerOptions,
};
use crate::types::{CompileResult, PipelineKind, TargetSelector};
use crate::watch::{start_watching, stop_watching, WatchHandle};

use super::ReloadHook;

/// Every pipeline the project defines, keyed by kind.
#[derive(Default, Clone)]
pub struct PipelineSet {
    pipelines: BTreeMap<PipelineKind, Arc<dyn Pipeline>>,
}

impl PipelineSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, pipeline: Arc<dyn Pipeline>) {
        self.pipelines.insert(pipeline.kind(), pipeline);
    }

    pub fn with(mut self, pipeline: Arc<dyn Pipeline>) -> Self {
        self.insert(pipeline);
        self
    }

    pub fn get(&self, kind: PipelineKind) -> Option<&Arc<dyn Pipeline>> {
        self.pipelines.get(&kind)
    }

    /// The pipelines `target` maps to, in a stable order.
    pub fn select(&self, target: TargetSelector) -> Vec<Arc<dyn Pipeline>> {
        target
            .pipelines()
            .iter()
            .filter_map(|kind| self.pipelines.get(kind).cloned())
            .collect()
    }
}

/// Per-pipeline outcome of a one-shot build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub results: Vec<(PipelineKind, CompileResult)>,
}

impl RunSummary {
    pub fn all_succeeded(&self) -> bool {
        self.results.iter().all(|(_, r)| r.success)
    }

    pub fn failed(&self) -> Vec<PipelineKind> {
        self.results
            .iter()
            .filter(|(_, r)| !r.success)
            .map(|(k, _)| *k)
            .collect()
    }

    pub fn result(&self, kind: PipelineKind) -> Option<&CompileResult> {
        self.results.iter().find(|(k, _)| *k == kind).map(|(_, r)| r)
    }
}

/// Top-level dispatcher.
///
/// `Release` runs the selected pipelines once, concurrently. `Watch` and
/// `Serve` start a worker and a watcher per pipeline and then only react to
/// events until told to shut down.
pub struct Orchestrator {
    flags: BuildFlags,
    output: OutputDir,
    pipelines: Vec<Arc<dyn Pipeline>>,
    fs: Arc<dyn FileSystem>,
    reload: Option<Arc<ReloadHook>>,
}

impl Orchestrator {
    pub fn new(
        flags: BuildFlags,
        output: OutputDir,
        pipelines: &PipelineSet,
        fs: Arc<dyn FileSystem>,
    ) -> Self {
        Self {
            flags,
            output,
            pipelines: pipelines.select(flags.target),
            fs,
            reload: None,
        }
    }

    pub fn with_reload(mut self, hook: ReloadHook) -> Self {
        self.reload = Some(Arc::new(hook));
        self
    }

    pub fn selected(&self) -> Vec<PipelineKind> {
        self.pipelines.iter().map(|p| p.kind()).collect()
    }

    /// Run according to the mode. `Release` builds once and returns; watch
    /// modes keep running until `shutdown` resolves.
    pub async fn run_until<F>(&self, shutdown: F) -> Result<RunSummary>
    where
        F: Future<Output = ()>,
    {
        if !self.flags.mode.is_watching() {
            return self.run_once().await;
        }

        let session = self.start().await?;
        shutdown.await;
        session.stop().await;
        Ok(RunSummary::default())
    }

    async fn ensure_output(&self) -> Result<()> {
        let output = self.output.clone();
        run_blocking(move || output.ensure()).await?;
        Ok(())
    }

    /// Run every selected pipeline once, concurrently, and wait for all.
    ///
    /// A failing pipeline is logged and recorded; it never stops a sibling.
    pub async fn run_once(&self) -> Result<RunSummary> {
        self.ensure_output().await?;
        info!(
            mode = %self.flags.mode,
            pipelines = ?self.selected(),
            "starting build"
        );

        let timed = self.flags.timed;
        let handles: Vec<_> = self
            .pipelines
            .iter()
            .map(|pipeline| {
                let pipeline = Arc::clone(pipeline);
                let kind = pipeline.kind();
                let handle =
                    tokio::spawn(async move { invoke(pipeline.as_ref(), None, timed).await });
                (kind, handle)
            })
            .collect();

        let mut summary = RunSummary::default();
        for (kind, handle) in handles {
            let result = match handle.await {
                Ok(result) => result,
                Err(err) => {
                    error!(pipeline = %kind, error = %err, "pipeline task aborted");
                    CompileResult::failed()
                }
            };
            summary.results.push((kind, result));
        }

        let failed = summary.failed();
        if failed.is_empty() {
            info!("build finished");
        } else {
            warn!(?failed, "build finished with failures");
        }
        Ok(summary)
    }

    /// Watch modes: spawn one worker per pipeline, queue an initial full
    /// compile and attach its watcher.
    pub async fn start(&self) -> Result<WatchSession> {
        self.ensure_output().await?;
        info!(
            mode = %self.flags.mode,
            pipelines = ?self.selected(),
            "starting watch session"
        );

        let options = WorkerOptions {
            timed: self.flags.timed,
            reload: if self.flags.mode.live_reload() {
                self.reload.clone()
            } else {
                None
            },
        };

        let mut session = WatchSession::default();
        for pipeline in &self.pipelines {
            let kind = pipeline.kind();
            let worker = spawn_worker(Arc::clone(pipeline), self.output.clone(), options.clone());
            worker
                .submit(PipelineJob::Compile { changed: None })
                .await?;

            let spec = Arc::new(pipeline.spec().clone());
            match start_watching(spec, worker.sender(), Arc::clone(&self.fs)) {
                Ok(handle) => session.watchers.push(handle),
                Err(err) => {
                    error!(pipeline = %kind, error = %err, "failed to start watching; pipeline will not recompile");
                }
            }
            session.workers.push(worker);
        }

        Ok(session)
    }
}

/// Live watchers and workers of a watch-mode run.
#[derive(Debug, Default)]
pub struct WatchSession {
    workers: Vec<PipelineWorker>,
    watchers: Vec<WatchHandle>,
}

impl WatchSession {
    pub fn watched(&self) -> Vec<PipelineKind> {
        self.watchers.iter().map(|w| w.pipeline()).collect()
    }

    pub fn workers(&self) -> &[PipelineWorker] {
        &self.workers
    }

    /// Stop all watchers, then let the workers drain their queues.
    pub async fn stop(self) {
        for handle in self.watchers {
            stop_watching(handle).await;
        }
        for worker in self.workers {
            worker.shutdown().await;
        }
        info!("watch session stopped");
    }
}
