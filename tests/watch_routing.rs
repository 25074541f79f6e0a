mod common;
use crate::common::builders::ConfigFileBuilder;
use crate::common::fakes::{default_spec, ConcurrencyGauge, CountingPipeline, FakeToolRunner};
use crate::common::{eventually, init_tracing, with_timeout};

use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use assetpipe::engine::ReloadHook;
use assetpipe::fs::mock::MockFileSystem;
use assetpipe::fs::FileSystem;
use assetpipe::output::OutputDir;
use assetpipe::pipeline::{
    spawn_worker, PipelineJob, PipelineSpec, StylePipeline, StyleTools, WorkerOptions,
};
use assetpipe::types::{BuildMode, PipelineKind, WatchEvent, WatchEventKind};
use assetpipe::watch::{route, EventRouter};

type TestResult = Result<(), Box<dyn Error>>;

fn style_spec() -> PipelineSpec {
    default_spec(PipelineKind::Style, Path::new("/proj"), BuildMode::Watch)
}

fn ev(kind: WatchEventKind, path: &str) -> WatchEvent {
    WatchEvent::new(kind, path)
}

fn compile(path: &str) -> Option<PipelineJob> {
    Some(PipelineJob::Compile {
        changed: Some(PathBuf::from(path)),
    })
}

#[test]
fn add_and_change_of_watched_files_request_a_compile() {
    init_tracing();
    let spec = style_spec();

    assert_eq!(
        route(&ev(WatchEventKind::Add, "/proj/styles/site.less"), &spec),
        compile("/proj/styles/site.less")
    );
    assert_eq!(
        route(&ev(WatchEventKind::Change, "/proj/styles/partials/_vars.less"), &spec),
        compile("/proj/styles/partials/_vars.less")
    );
}

#[test]
fn unrelated_paths_are_ignored() {
    init_tracing();
    let spec = style_spec();

    assert_eq!(route(&ev(WatchEventKind::Change, "/proj/styles/notes.txt"), &spec), None);
    assert_eq!(route(&ev(WatchEventKind::Change, "/proj/scripts/app.ts"), &spec), None);
    assert_eq!(route(&ev(WatchEventKind::Add, "/elsewhere/site.less"), &spec), None);
}

#[test]
fn unlink_removes_artifacts_only_for_direct_sources() {
    init_tracing();
    let spec = style_spec();

    assert_eq!(
        route(&ev(WatchEventKind::Unlink, "/proj/styles/site.less"), &spec),
        Some(PipelineJob::RemoveArtifact {
            source: PathBuf::from("/proj/styles/site.less")
        })
    );
    assert_eq!(
        route(&ev(WatchEventKind::Unlink, "/proj/styles/partials/_vars.less"), &spec),
        None
    );
}

#[tokio::test]
async fn unchanged_content_is_filtered_but_adds_always_pass() -> TestResult {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_file("/proj/styles/site.less", "body{}");
    let mut router = EventRouter::new(Arc::new(style_spec()), Arc::new(fs.clone()));
    let change = ev(WatchEventKind::Change, "/proj/styles/site.less");
    let add = ev(WatchEventKind::Add, "/proj/styles/site.less");

    assert!(router.handle(&change).await.is_some());
    assert!(router.handle(&change).await.is_none());
    assert!(router.handle(&add).await.is_some());

    fs.add_file("/proj/styles/site.less", "body{color:red}");
    assert!(router.handle(&change).await.is_some());
    Ok(())
}

#[tokio::test]
async fn deleted_source_loses_only_its_own_artifact() -> TestResult {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_file("/proj/styles/a.less", "a{}\n");
    fs.add_file("/proj/styles/b.less", "b{}\n");
    let runner = FakeToolRunner::new(fs.clone());

    let cfg = ConfigFileBuilder::new()
        .compiler("lessc {input} {output}")
        .build();
    let spec = PipelineSpec::for_kind(PipelineKind::Style, &cfg, Path::new("/proj"), BuildMode::Watch)?;
    let output = OutputDir::new(spec.output_dir.clone(), Arc::new(fs.clone()));
    let pipeline = StylePipeline::new(
        spec,
        StyleTools::from_config(cfg.style()),
        Arc::new(fs.clone()),
        Arc::new(runner),
    );

    let worker = spawn_worker(Arc::new(pipeline), output, WorkerOptions::default());
    worker.submit(PipelineJob::Compile { changed: None }).await?;
    with_timeout(eventually(|| fs.is_file(Path::new("/proj/public/assets/a.css")))).await;

    fs.remove_file(Path::new("/proj/styles/a.less"))?;
    worker
        .submit(PipelineJob::RemoveArtifact {
            source: PathBuf::from("/proj/styles/a.less"),
        })
        .await?;
    with_timeout(worker.shutdown()).await;

    assert!(!fs.exists(Path::new("/proj/public/assets/a.css")));
    assert!(fs.is_file(Path::new("/proj/public/assets/b.css")));
    Ok(())
}

#[tokio::test]
async fn worker_never_overlaps_invocations() -> TestResult {
    init_tracing();
    let gauge = Arc::new(ConcurrencyGauge::default());
    let pipeline = CountingPipeline::new(style_spec())
        .with_delay(Duration::from_millis(30))
        .with_gauge(Arc::clone(&gauge));
    let calls = pipeline.calls();
    let output = OutputDir::new("/proj/public/assets", Arc::new(MockFileSystem::new()));

    let worker = spawn_worker(Arc::new(pipeline), output, WorkerOptions::default());
    for name in ["a", "b", "c", "d", "e"] {
        worker
            .submit(PipelineJob::Compile {
                changed: Some(PathBuf::from(format!("/proj/styles/{name}.less"))),
            })
            .await?;
    }
    with_timeout(worker.shutdown()).await;

    assert_eq!(gauge.peak(), 1);
    let calls = calls.lock().unwrap();
    assert!(!calls.is_empty() && calls.len() <= 5, "{calls:?}");
    Ok(())
}

#[tokio::test]
async fn serve_mode_notifies_reload_after_successful_compiles_only() -> TestResult {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_file("/proj/styles/site.less", "body{}\n");
    let runner = FakeToolRunner::new(fs.clone());

    let cfg = ConfigFileBuilder::new()
        .compiler("lessc {input} {output}")
        .build();
    let spec = PipelineSpec::for_kind(PipelineKind::Style, &cfg, Path::new("/proj"), BuildMode::Serve)?;
    let output = OutputDir::new(spec.output_dir.clone(), Arc::new(fs.clone()));
    let pipeline = StylePipeline::new(
        spec,
        StyleTools::from_config(cfg.style()),
        Arc::new(fs.clone()),
        Arc::new(runner.clone()),
    );
    let options = WorkerOptions {
        timed: true,
        reload: Some(Arc::new(ReloadHook::new(
            Some("reload-clients".to_string()),
            "/proj",
            Arc::new(runner.clone()),
        ))),
    };

    let worker = spawn_worker(Arc::new(pipeline), output, options);
    worker.submit(PipelineJob::Compile { changed: None }).await?;
    with_timeout(worker.shutdown()).await;
    assert_eq!(runner.labels(), ["compile", "reload"]);

    runner.fail_label("compile");
    let spec = PipelineSpec::for_kind(PipelineKind::Style, &cfg, Path::new("/proj"), BuildMode::Serve)?;
    let pipeline = StylePipeline::new(
        spec,
        StyleTools::from_config(cfg.style()),
        Arc::new(fs.clone()),
        Arc::new(runner.clone()),
    );
    let options = WorkerOptions {
        timed: false,
        reload: Some(Arc::new(ReloadHook::new(
            Some("reload-clients".to_string()),
            "/proj",
            Arc::new(runner.clone()),
        ))),
    };
    let output = OutputDir::new("/proj/public/assets", Arc::new(fs.clone()));
    let worker = spawn_worker(Arc::new(pipeline), output, options);
    worker.submit(PipelineJob::Compile { changed: None }).await?;
    with_timeout(worker.shutdown()).await;
    assert_eq!(runner.labels(), ["compile", "reload", "compile"]);
    Ok(())
}
