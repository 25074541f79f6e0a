use std::collections::{BTreeSet, HashSet};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use assetpipe::config::ConfigFile;
use assetpipe::errors::AssetpipeError;
use assetpipe::exec::{CommandInvocation, CommandOutcome, CommandRunner};
use assetpipe::fs::mock::MockFileSystem;
use assetpipe::fs::FileSystem;
use assetpipe::pipeline::script::TransformFuture;
use assetpipe::pipeline::{Pipeline, PipelineFuture, PipelineSpec, ScriptTransform};
use assetpipe::types::{BuildMode, CompileResult, PipelineKind};

/// Spec for `kind` built from the default project file rooted at `root`.
pub fn default_spec(kind: PipelineKind, root: &Path, mode: BuildMode) -> PipelineSpec {
    PipelineSpec::for_kind(kind, &ConfigFile::default(), root, mode)
        .expect("default config yields a valid spec")
}

/// Tracks how many compiles run at the same time.
#[derive(Debug, Default)]
pub struct ConcurrencyGauge {
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl ConcurrencyGauge {
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    fn enter(&self) {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn leave(&self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

/// A fake pipeline that:
/// - records the `changed` argument of every invocation
/// - optionally sleeps, to widen overlap windows
/// - succeeds with no artifacts, or fails with a `CompileFailed` error.
pub struct CountingPipeline {
    spec: PipelineSpec,
    calls: Arc<Mutex<Vec<Option<PathBuf>>>>,
    fail: bool,
    delay: Duration,
    gauge: Arc<ConcurrencyGauge>,
}

impl CountingPipeline {
    pub fn new(spec: PipelineSpec) -> Self {
        Self {
            spec,
            calls: Arc::new(Mutex::new(Vec::new())),
            fail: false,
            delay: Duration::ZERO,
            gauge: Arc::new(ConcurrencyGauge::default()),
        }
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_gauge(mut self, gauge: Arc<ConcurrencyGauge>) -> Self {
        self.gauge = gauge;
        self
    }

    /// Shared view of the recorded invocations.
    pub fn calls(&self) -> Arc<Mutex<Vec<Option<PathBuf>>>> {
        Arc::clone(&self.calls)
    }
}

impl Pipeline for CountingPipeline {
    fn spec(&self) -> &PipelineSpec {
        &self.spec
    }

    fn compile<'a>(&'a self, changed: Option<&'a Path>) -> PipelineFuture<'a> {
        Box::pin(async move {
            self.gauge.enter();
            self.calls
                .lock()
                .unwrap()
                .push(changed.map(Path::to_path_buf));
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.gauge.leave();

            if self.fail {
                return Err(AssetpipeError::CompileFailed {
                    pipeline: self.spec.kind,
                    step: "compile".to_string(),
                    code: 1,
                });
            }
            Ok(CompileResult::succeeded(BTreeSet::new()))
        })
    }
}

/// A fake tool runner over a [`MockFileSystem`].
///
/// Every rendered command is treated as `<tool...> <input> <output>`: the
/// last two whitespace-separated words. The tool copies input to output and
/// appends a `/* <label> */` line, so the chain a file went through can be
/// read back from the artifact. Invocations labelled `reload` are only
/// recorded.
#[derive(Clone)]
pub struct FakeToolRunner {
    fs: MockFileSystem,
    calls: Arc<Mutex<Vec<CommandInvocation>>>,
    failing: Arc<Mutex<HashSet<String>>>,
}

impl FakeToolRunner {
    pub fn new(fs: MockFileSystem) -> Self {
        Self {
            fs,
            calls: Arc::new(Mutex::new(Vec::new())),
            failing: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Make every invocation with this label exit with status 1.
    pub fn fail_label(&self, label: &str) {
        self.failing.lock().unwrap().insert(label.to_string());
    }

    pub fn clear_failures(&self) {
        self.failing.lock().unwrap().clear();
    }

    pub fn calls(&self) -> Vec<CommandInvocation> {
        self.calls.lock().unwrap().clone()
    }

    pub fn labels(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.label).collect()
    }

    fn apply(&self, invocation: &CommandInvocation) -> CommandOutcome {
        if invocation.label == "reload" {
            return CommandOutcome::Success;
        }
        let words: Vec<&str> = invocation.cmd.split_whitespace().collect();
        let [.., input, output] = words.as_slice() else {
            return CommandOutcome::Failed(2);
        };
        let Some(mut content) = self.fs.contents(*input) else {
            return CommandOutcome::Failed(2);
        };
        content.extend_from_slice(format!("/* {} */\n", invocation.label).as_bytes());
        match self.fs.write(Path::new(*output), &content) {
            Ok(()) => CommandOutcome::Success,
            Err(_) => CommandOutcome::Failed(2),
        }
    }
}

impl CommandRunner for FakeToolRunner {
    fn run<'a>(
        &'a self,
        invocation: &'a CommandInvocation,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<CommandOutcome>> + Send + 'a>> {
        Box::pin(async move {
            self.calls.lock().unwrap().push(invocation.clone());
            if self.failing.lock().unwrap().contains(&invocation.label) {
                return Ok(CommandOutcome::Failed(1));
            }
            Ok(self.apply(invocation))
        })
    }
}

/// A script transform that always fails.
#[derive(Debug, Default)]
pub struct BrokenBundler;

impl ScriptTransform for BrokenBundler {
    fn name(&self) -> &str {
        "broken"
    }

    fn bundle<'a>(&'a self, _sources: &'a [PathBuf], _output_dir: &'a Path) -> TransformFuture<'a> {
        Box::pin(async { Err(anyhow::anyhow!("bundler exploded")) })
    }
}
