mod common;
use crate::common::builders::{write_file, ConfigFileBuilder};
use crate::common::{eventually, init_tracing, with_timeout};

use std::error::Error;
use std::sync::Arc;

use tempfile::tempdir;

use assetpipe::build_pipelines;
use assetpipe::config::BuildFlags;
use assetpipe::engine::Orchestrator;
use assetpipe::exec::ShellCommandRunner;
use assetpipe::fs::{FileSystem, RealFileSystem};
use assetpipe::output::OutputDir;
use assetpipe::types::{BuildMode, PipelineKind, TargetSelector};

type TestResult = Result<(), Box<dyn Error>>;

/// End-to-end: real watcher, real `sh` compiler, real directory tree.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn watch_mode_follows_adds_and_deletes_on_disk() -> TestResult {
    init_tracing();
    let dir = tempdir()?;
    let root = dir.path().canonicalize()?;
    write_file(&root, "styles/site.less", "body { margin: 0; }\n");
    write_file(&root, "styles/partials/_vars.less", "@c: red;\n");

    let cfg = ConfigFileBuilder::new()
        .compiler("cp {input} {output}")
        .build();
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let set = build_pipelines(
        &cfg,
        &root,
        BuildMode::Watch,
        Arc::clone(&fs),
        Arc::new(ShellCommandRunner),
    )?;
    let flags = BuildFlags {
        mode: BuildMode::Watch,
        target: TargetSelector::StyleOnly,
        timed: false,
    };
    let out_dir = root.join("public/assets");
    let output = OutputDir::new(&out_dir, Arc::clone(&fs));
    let orch = Orchestrator::new(flags, output, &set, fs);

    let session = orch.start().await?;
    assert_eq!(session.watched(), vec![PipelineKind::Style]);

    // Initial full compile.
    with_timeout(eventually(|| out_dir.join("site.css").is_file())).await;

    // A new direct source gets its own artifact.
    write_file(&root, "styles/extra.less", ".extra {}\n");
    with_timeout(eventually(|| out_dir.join("extra.css").is_file())).await;

    // Deleting a source removes exactly its artifact.
    std::fs::remove_file(root.join("styles/site.less"))?;
    with_timeout(eventually(|| !out_dir.join("site.css").exists())).await;
    assert!(out_dir.join("extra.css").is_file());
    assert!(!out_dir.join("_vars.css").exists());

    with_timeout(session.stop()).await;
    assert!(!root.join(".assetpipe/staging/style").exists());
    Ok(())
}
