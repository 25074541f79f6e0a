// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod output;
pub mod pipeline;
pub mod types;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::{load_or_default, project_root, BuildFlags, ConfigFile, EnvFlags, LayeredFlags};
use crate::engine::{Orchestrator, PipelineSet, ReloadHook, RunSummary};
use crate::errors::Result;
use crate::exec::{CommandRunner, ShellCommandRunner};
use crate::fs::{FileSystem, RealFileSystem};
use crate::output::OutputDir;
use crate::pipeline::{
    InertBundler, PipelineSpec, ScriptPipeline, StylePipeline, StyleTools,
};
use crate::types::{BuildMode, PipelineKind};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - flag resolution (CLI switches over environment)
/// - project file loading
/// - pipeline construction
/// - the orchestrator, and for watch modes Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<RunSummary> {
    let flags = BuildFlags::resolve(&LayeredFlags::new(&args, &EnvFlags));

    let config_path = PathBuf::from(&args.config);
    let cfg = load_or_default(&config_path)?;
    let root = absolute_root(&project_root(&config_path));
    info!(
        mode = %flags.mode,
        target = ?flags.target,
        timed = flags.timed,
        ?root,
        "resolved build flags"
    );

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let runner: Arc<dyn CommandRunner> = Arc::new(ShellCommandRunner);
    let pipelines = build_pipelines(&cfg, &root, flags.mode, Arc::clone(&fs), Arc::clone(&runner))?;

    if args.dry_run {
        print_dry_run(&cfg, &root, flags);
        return Ok(RunSummary::default());
    }

    let output = OutputDir::new(root.join(&cfg.paths().output), Arc::clone(&fs));
    let reload = ReloadHook::new(cfg.serve().reload_cmd.clone(), &root, runner);
    let orchestrator = Orchestrator::new(flags, output, &pipelines, fs).with_reload(reload);

    orchestrator.run_until(shutdown_signal()).await
}

/// Build both pipelines for `mode`. The orchestrator picks which ones run.
pub fn build_pipelines(
    cfg: &ConfigFile,
    root: &Path,
    mode: BuildMode,
    fs: Arc<dyn FileSystem>,
    runner: Arc<dyn CommandRunner>,
) -> Result<PipelineSet> {
    let style_spec = PipelineSpec::for_kind(PipelineKind::Style, cfg, root, mode)?;
    let script_spec = PipelineSpec::for_kind(PipelineKind::Script, cfg, root, mode)?;

    let style = StylePipeline::new(
        style_spec,
        StyleTools::from_config(cfg.style()),
        Arc::clone(&fs),
        runner,
    );
    let script = ScriptPipeline::new(script_spec, fs, Arc::new(InertBundler));

    Ok(PipelineSet::new()
        .with(Arc::new(style))
        .with(Arc::new(script)))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl+C; running until killed");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

/// External tools run with the root as their working directory and watcher
/// paths are matched against it, so it must be absolute.
fn absolute_root(root: &Path) -> PathBuf {
    if let Ok(canonical) = root.canonicalize() {
        return canonical;
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(root),
        Err(_) => root.to_path_buf(),
    }
}

/// Simple dry-run output: print the resolved flags and pipeline layout.
fn print_dry_run(cfg: &ConfigFile, root: &Path, flags: BuildFlags) {
    println!("assetpipe dry-run");
    println!("  root = {}", root.display());
    println!("  mode = {}", flags.mode);
    println!("  target = {:?}", flags.target);
    println!("  timings = {}", flags.timed);
    println!("  output = {}", root.join(&cfg.paths().output).display());
    println!();

    for kind in flags.target.pipelines() {
        println!("{kind}:");
        match kind {
            PipelineKind::Style => {
                let style = cfg.style();
                println!("  sources: {:?}", style.sources);
                println!("  watch: {:?}", style.watch);
                println!("  staging: {}", root.join(&style.staging).display());
                println!("  compiler: {}", style.compiler);
                if flags.mode.post_process() {
                    for step in &style.post_process {
                        println!("  post-process {}: {}", step.name, step.cmd);
                    }
                }
            }
            PipelineKind::Script => {
                let script = cfg.script();
                println!("  sources: {:?}", script.sources);
                println!("  watch: {:?}", script.watch);
                println!("  transform: inert");
            }
        }
    }

    if flags.mode.live_reload() {
        match &cfg.serve().reload_cmd {
            Some(cmd) => println!("reload: {cmd}"),
            None => println!("reload: log only"),
        }
    }

    debug!("dry-run complete (no execution)");
}
