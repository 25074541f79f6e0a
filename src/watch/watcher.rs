// src/watch/watcher.rs

use std::sync::Arc;

use anyhow::Result;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::fs::FileSystem;
use crate::pipeline::{PipelineJob, PipelineSpec};
use crate::types::PipelineKind;
use crate::watch::event_handler::{translate, EventRouter};

/// A pipeline's live filesystem watch.
///
/// Owns the OS watcher and the task that routes its events. Pass it to
/// [`stop_watching`] to tear both down.
pub struct WatchHandle {
    pipeline: PipelineKind,
    watcher: RecommendedWatcher,
    task: JoinHandle<()>,
}

impl std::fmt::Debug for WatchHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchHandle")
            .field("pipeline", &self.pipeline)
            .finish_non_exhaustive()
    }
}

impl WatchHandle {
    pub fn pipeline(&self) -> PipelineKind {
        self.pipeline
    }
}

/// Start watching the source tree of one pipeline.
///
/// Every literal base directory of the pipeline's patterns is watched
/// recursively without following symlinks. Routed jobs go to `jobs`, the
/// pipeline's worker queue.
pub fn start_watching(
    spec: Arc<PipelineSpec>,
    jobs: mpsc::Sender<PipelineJob>,
    fs: Arc<dyn FileSystem>,
) -> Result<WatchHandle> {
    let pipeline = spec.kind;

    // Channel from the blocking notify callback into the async world.
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if let Err(err) = event_tx.send(event) {
                    // Not in a tracing context here; fall back to stderr.
                    eprintln!("assetpipe: failed to forward watch event: {err}");
                }
            }
            Err(err) => {
                eprintln!("assetpipe: file watch error: {err}");
            }
        },
        Config::default().with_follow_symlinks(false),
    )?;

    let mut registered = 0usize;
    for dir in spec.patterns.watch_roots(&spec.root) {
        if !fs.is_dir(&dir) {
            warn!(pipeline = %pipeline, ?dir, "watch root does not exist; skipping");
            continue;
        }
        watcher.watch(&dir, RecursiveMode::Recursive)?;
        registered += 1;
        info!(pipeline = %pipeline, ?dir, "watching");
    }
    if registered == 0 {
        warn!(pipeline = %pipeline, "no watch roots registered; changes will go unnoticed");
    }

    let mut router = EventRouter::new(Arc::clone(&spec), fs);
    let task = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            debug!(pipeline = %pipeline, ?event, "received notify event");

            for watch_event in translate(&event) {
                let Some(job) = router.handle(&watch_event).await else {
                    continue;
                };
                debug!(pipeline = %pipeline, ?job, "watch match -> queueing job");
                if jobs.send(job).await.is_err() {
                    debug!(pipeline = %pipeline, "worker queue closed; stopping event loop");
                    return;
                }
            }
        }
        debug!(pipeline = %pipeline, "watch event loop finished");
    });

    Ok(WatchHandle {
        pipeline,
        watcher,
        task,
    })
}

/// Stop a watch started by [`start_watching`].
///
/// Dropping the OS watcher closes the event channel, which ends the routing
/// task; this waits for it.
pub async fn stop_watching(handle: WatchHandle) {
    let WatchHandle {
        pipeline,
        watcher,
        task,
    } = handle;
    drop(watcher);

    if let Err(err) = task.await {
        warn!(pipeline = %pipeline, error = %err, "watch event loop ended abnormally");
    }
    info!(pipeline = %pipeline, "stopped watching");
}
