// src/watch/event_handler.rs

//! Turning raw `notify` events into pipeline jobs.
//!
//! - [`translate`] normalises a `notify::Event` into `WatchEvent`s.
//! - [`route`] maps one `WatchEvent` onto a job for one pipeline:
//!   `Add`/`Change` of a watched file → compile with that file;
//!   `Unlink` of a direct source → remove its artifact.
//! - [`EventRouter`] adds the content-hash filter on top of `route`.

use std::path::PathBuf;
use std::sync::Arc;

use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind};
use tracing::{debug, warn};

use crate::fs::FileSystem;
use crate::pipeline::{PipelineJob, PipelineSpec};
use crate::types::{WatchEvent, WatchEventKind};
use crate::watch::cache::{compute_file_hash, ContentCache};

/// Normalise one `notify` event. Access and unknown events yield nothing.
pub fn translate(event: &Event) -> Vec<WatchEvent> {
    let per_path = |kind: WatchEventKind| -> Vec<WatchEvent> {
        event
            .paths
            .iter()
            .map(|p| WatchEvent::new(kind, p.clone()))
            .collect()
    };

    match event.kind {
        EventKind::Create(_) => per_path(WatchEventKind::Add),
        EventKind::Remove(_) => per_path(WatchEventKind::Unlink),
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => per_path(WatchEventKind::Unlink),
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => per_path(WatchEventKind::Add),
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) if event.paths.len() == 2 => vec![
            WatchEvent::new(WatchEventKind::Unlink, event.paths[0].clone()),
            WatchEvent::new(WatchEventKind::Add, event.paths[1].clone()),
        ],
        // Backends that cannot tell which side of a rename a path is on.
        EventKind::Modify(ModifyKind::Name(_)) => event
            .paths
            .iter()
            .map(|p| {
                let kind = if p.exists() {
                    WatchEventKind::Add
                } else {
                    WatchEventKind::Unlink
                };
                WatchEvent::new(kind, p.clone())
            })
            .collect(),
        EventKind::Modify(_) => per_path(WatchEventKind::Change),
        EventKind::Access(_) | EventKind::Any | EventKind::Other => Vec::new(),
    }
}

/// Map one event onto a job for the pipeline described by `spec`.
///
/// Returns `None` for paths the pipeline does not watch and for deletions of
/// nested files, which have no artifact of their own.
pub fn route(event: &WatchEvent, spec: &PipelineSpec) -> Option<PipelineJob> {
    let rel = spec.relative(&event.path)?;
    if !spec.patterns.is_watched(&rel) {
        return None;
    }

    match event.kind {
        WatchEventKind::Add | WatchEventKind::Change => Some(PipelineJob::Compile {
            changed: Some(event.path.clone()),
        }),
        WatchEventKind::Unlink if spec.patterns.is_direct(&rel) => {
            Some(PipelineJob::RemoveArtifact {
                source: event.path.clone(),
            })
        }
        WatchEventKind::Unlink => {
            debug!(path = %rel, "nested source removed; no artifact to remove");
            None
        }
    }
}

/// Per-pipeline router holding the content-hash filter.
#[derive(Debug)]
pub struct EventRouter {
    spec: Arc<PipelineSpec>,
    fs: Arc<dyn FileSystem>,
    cache: ContentCache,
}

impl EventRouter {
    pub fn new(spec: Arc<PipelineSpec>, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            spec,
            fs,
            cache: ContentCache::new(),
        }
    }

    pub fn spec(&self) -> &PipelineSpec {
        &self.spec
    }

    /// Route `event`, dropping `Change`s whose content hash is unchanged.
    pub async fn handle(&mut self, event: &WatchEvent) -> Option<PipelineJob> {
        let job = route(event, &self.spec)?;

        match event.kind {
            WatchEventKind::Unlink => {
                self.cache.forget(&event.path);
                Some(job)
            }
            WatchEventKind::Add | WatchEventKind::Change => {
                match self.hash(event.path.clone()).await {
                    Some(hash) => {
                        let changed = self.cache.record(&event.path, hash);
                        // A fresh Add always compiles, even for known content.
                        (changed || event.kind == WatchEventKind::Add).then_some(job)
                    }
                    None => Some(job),
                }
            }
        }
    }

    async fn hash(&self, path: PathBuf) -> Option<String> {
        let fs = Arc::clone(&self.fs);
        let joined = tokio::task::spawn_blocking(move || {
            let hash = compute_file_hash(fs.as_ref(), &path);
            (path, hash)
        })
        .await;

        match joined {
            Ok((_, Ok(hash))) => Some(hash),
            Ok((path, Err(err))) => {
                warn!(?path, error = %err, "failed to hash changed file; compiling anyway");
                None
            }
            Err(err) => {
                warn!(error = %err, "hashing task failed; compiling anyway");
                None
            }
        }
    }
}
