// src/pipeline/worker.rs

//! Per-pipeline job queue.
//!
//! In watch modes every pipeline owns exactly one worker task. All compile
//! and artifact-removal requests for that pipeline go through its channel
//! and run one at a time, so two invocations never share a staging
//! directory. Jobs that pile up while a compile is running are coalesced:
//!
//! - consecutive compiles for the same file collapse into one;
//! - consecutive compiles for different files collapse into a full compile;
//! - removals keep their position relative to compiles.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::engine::ReloadHook;
use crate::output::OutputDir;
use crate::types::{CompileResult, PipelineKind};

use super::{run_blocking, Pipeline};

/// Work item for a pipeline worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineJob {
    Compile { changed: Option<PathBuf> },
    RemoveArtifact { source: PathBuf },
}

#[derive(Clone, Default)]
pub struct WorkerOptions {
    /// Log every invocation's elapsed time at info instead of debug.
    pub timed: bool,
    /// Run after every successful compile (`Serve` mode).
    pub reload: Option<Arc<ReloadHook>>,
}

/// Handle to a running worker.
pub struct PipelineWorker {
    kind: PipelineKind,
    tx: mpsc::Sender<PipelineJob>,
    handle: JoinHandle<()>,
}

impl std::fmt::Debug for PipelineWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineWorker")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl PipelineWorker {
    pub fn kind(&self) -> PipelineKind {
        self.kind
    }

    pub fn sender(&self) -> mpsc::Sender<PipelineJob> {
        self.tx.clone()
    }

    pub async fn submit(&self, job: PipelineJob) -> anyhow::Result<()> {
        self.tx
            .send(job)
            .await
            .map_err(|_| anyhow::anyhow!("{} worker has stopped", self.kind))
    }

    /// Finish queued jobs and stop. Other senders (watchers) must already be
    /// gone for this to return.
    pub async fn shutdown(self) {
        drop(self.tx);
        if let Err(err) = self.handle.await {
            warn!(pipeline = %self.kind, error = %err, "pipeline worker ended abnormally");
        }
    }
}

/// Spawn the worker task for `pipeline`.
pub fn spawn_worker(
    pipeline: Arc<dyn Pipeline>,
    output: OutputDir,
    options: WorkerOptions,
) -> PipelineWorker {
    let kind = pipeline.kind();
    let (tx, mut rx) = mpsc::channel::<PipelineJob>(64);

    let handle = tokio::spawn(async move {
        debug!(pipeline = %kind, "pipeline worker started");
        let mut pending: VecDeque<PipelineJob> = VecDeque::new();

        loop {
            if pending.is_empty() {
                match rx.recv().await {
                    Some(job) => pending.push_back(job),
                    None => break,
                }
            }
            while let Ok(job) = rx.try_recv() {
                pending.push_back(job);
            }

            let Some(job) = next_batch(&mut pending) else {
                continue;
            };
            run_job(pipeline.as_ref(), &output, &options, job).await;
        }

        debug!(pipeline = %kind, "pipeline worker finished (channel closed)");
    });

    PipelineWorker { kind, tx, handle }
}

/// Pop the next job, merging any compiles queued directly behind it.
pub fn next_batch(pending: &mut VecDeque<PipelineJob>) -> Option<PipelineJob> {
    let first = pending.pop_front()?;
    let PipelineJob::Compile { mut changed } = first else {
        return Some(first);
    };

    while let Some(PipelineJob::Compile { changed: next }) = pending.front() {
        changed = match (changed, next) {
            (Some(a), Some(b)) if a == *b => Some(a),
            _ => None,
        };
        pending.pop_front();
    }

    Some(PipelineJob::Compile { changed })
}

async fn run_job(
    pipeline: &dyn Pipeline,
    output: &OutputDir,
    options: &WorkerOptions,
    job: PipelineJob,
) {
    match job {
        PipelineJob::Compile { changed } => {
            let result = invoke(pipeline, changed.as_deref(), options.timed).await;
            if result.success {
                if let Some(reload) = &options.reload {
                    reload.notify(pipeline.kind(), &result).await;
                }
            }
        }
        PipelineJob::RemoveArtifact { source } => {
            let output = output.clone();
            let ext = pipeline.spec().artifact_extension.clone();
            let kind = pipeline.kind();
            let src = source.clone();
            if let Err(err) = run_blocking(move || output.remove_artifact(&src, &ext)).await {
                warn!(
                    pipeline = %kind,
                    path = ?source,
                    error = %err,
                    "failed to remove artifact"
                );
            }
        }
    }
}

/// The invocation boundary: run one compile, log the outcome and contain
/// any error in the returned `CompileResult`.
pub async fn invoke(pipeline: &dyn Pipeline, changed: Option<&Path>, timed: bool) -> CompileResult {
    let kind = pipeline.kind();
    let started = Instant::now();
    debug!(pipeline = %kind, ?changed, "pipeline invocation started");

    let result = match pipeline.compile(changed).await {
        Ok(result) => result,
        Err(err) => {
            error!(pipeline = %kind, error = %err, "pipeline invocation failed");
            CompileResult::failed()
        }
    };

    let elapsed_ms = started.elapsed().as_millis() as u64;
    if timed {
        info!(
            pipeline = %kind,
            success = result.success,
            elapsed_ms,
            "pipeline invocation finished"
        );
    } else {
        debug!(
            pipeline = %kind,
            success = result.success,
            elapsed_ms,
            "pipeline invocation finished"
        );
    }
    if result.success {
        info!(
            pipeline = %kind,
            artifacts = result.produced_files.len(),
            "pipeline up to date"
        );
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(path: Option<&str>) -> PipelineJob {
        PipelineJob::Compile {
            changed: path.map(PathBuf::from),
        }
    }

    #[test]
    fn same_file_compiles_collapse_to_that_file() {
        let mut q = VecDeque::from([compile(Some("a.less")), compile(Some("a.less"))]);
        assert_eq!(next_batch(&mut q), Some(compile(Some("a.less"))));
        assert!(q.is_empty());
    }

    #[test]
    fn different_files_collapse_to_full_compile() {
        let mut q = VecDeque::from([
            compile(Some("a.less")),
            compile(Some("b.less")),
            compile(Some("a.less")),
        ]);
        assert_eq!(next_batch(&mut q), Some(compile(None)));
        assert!(q.is_empty());
    }

    #[test]
    fn removals_are_not_reordered() {
        let remove = PipelineJob::RemoveArtifact {
            source: PathBuf::from("a.less"),
        };
        let mut q = VecDeque::from([
            compile(Some("b.less")),
            remove.clone(),
            compile(Some("c.less")),
        ]);

        assert_eq!(next_batch(&mut q), Some(compile(Some("b.less"))));
        assert_eq!(next_batch(&mut q), Some(remove));
        assert_eq!(next_batch(&mut q), Some(compile(Some("c.less"))));
        assert_eq!(next_batch(&mut q), None);
    }
}
