// src/engine/reload.rs

//! Live-reload notification for `Serve` mode.
//!
//! The reload transport itself belongs to an external server; this hook
//! only tells it that artifacts changed, by running `serve.reload_cmd`.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};

use crate::exec::{render_template, CommandInvocation, CommandOutcome, CommandRunner};
use crate::types::{CompileResult, PipelineKind};

pub struct ReloadHook {
    cmd: Option<String>,
    root: PathBuf,
    runner: Arc<dyn CommandRunner>,
}

impl std::fmt::Debug for ReloadHook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReloadHook")
            .field("cmd", &self.cmd)
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl ReloadHook {
    pub fn new(cmd: Option<String>, root: impl Into<PathBuf>, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            cmd,
            root: root.into(),
            runner,
        }
    }

    /// Announce fresh artifacts. Failures are logged, never returned.
    pub async fn notify(&self, pipeline: PipelineKind, result: &CompileResult) {
        let Some(template) = &self.cmd else {
            info!(
                pipeline = %pipeline,
                artifacts = result.produced_files.len(),
                "artifacts updated; live-reload clients may refresh"
            );
            return;
        };

        let invocation = CommandInvocation {
            label: "reload".to_string(),
            cmd: render_template(template, &self.root, &self.root, &self.root),
            cwd: self.root.clone(),
        };

        match self.runner.run(&invocation).await {
            Ok(CommandOutcome::Success) => {
                info!(pipeline = %pipeline, "live-reload notified");
            }
            Ok(CommandOutcome::Failed(code)) => {
                warn!(pipeline = %pipeline, exit_code = code, "reload command failed");
            }
            Err(err) => {
                warn!(pipeline = %pipeline, error = %err, "could not run reload command");
            }
        }
    }
}
