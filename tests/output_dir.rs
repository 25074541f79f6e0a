mod common;
use crate::common::builders::write_file;
use crate::common::init_tracing;

use std::error::Error;
use std::path::Path;
use std::sync::Arc;

use tempfile::tempdir;

use assetpipe::fs::mock::MockFileSystem;
use assetpipe::fs::{FileSystem, RealFileSystem};
use assetpipe::output::OutputDir;

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn ensure_is_idempotent_and_keeps_contents() -> TestResult {
    init_tracing();
    let dir = tempdir()?;
    let out = OutputDir::new(dir.path().join("public/assets"), Arc::new(RealFileSystem));

    out.ensure()?;
    write_file(out.path(), "site.css", "body{}");
    out.ensure()?;

    assert!(out.path().is_dir());
    assert_eq!(std::fs::read_to_string(out.path().join("site.css"))?, "body{}");
    Ok(())
}

#[test]
fn removing_an_artifact_leaves_its_siblings() -> TestResult {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_file("/proj/public/assets/a.css", "a");
    fs.add_file("/proj/public/assets/b.css", "b");
    let out = OutputDir::new("/proj/public/assets", Arc::new(fs.clone()));

    let removed = out.remove_artifact(Path::new("/proj/styles/a.less"), "css")?;

    assert_eq!(removed.as_deref(), Some(Path::new("/proj/public/assets/a.css")));
    assert!(!fs.exists(Path::new("/proj/public/assets/a.css")));
    assert!(fs.is_file(Path::new("/proj/public/assets/b.css")));
    Ok(())
}

#[test]
fn removing_a_missing_artifact_is_not_an_error() -> TestResult {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_dir("/proj/public/assets");
    let out = OutputDir::new("/proj/public/assets", Arc::new(fs));

    assert_eq!(out.remove_artifact(Path::new("/proj/styles/gone.less"), "css")?, None);
    assert_eq!(out.remove_artifact(Path::new("/proj/styles/gone.less"), "css")?, None);
    Ok(())
}
