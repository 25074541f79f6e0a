mod common;
use crate::common::builders::ConfigFileBuilder;
use crate::common::init_tracing;

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use tempfile::tempdir;

use assetpipe::config::{load_and_validate, load_or_default, project_root, ConfigFile};
use assetpipe::errors::AssetpipeError;
use assetpipe::pipeline::PipelineSpec;
use assetpipe::types::{BuildMode, PipelineKind};

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn loads_a_full_project_file() -> TestResult {
    init_tracing();

    let dir = tempdir()?;
    let path = dir.path().join("Assetpipe.toml");
    fs::write(
        &path,
        r#"
[paths]
output = "dist"

[style]
sources = ["less/*.less"]
watch = ["less/**/*.less"]
compiler = "lessc {input} {output}"

[[style.post_process]]
name = "minify"
cmd = "cleancss -o {output} {input}"

[script]
sources = ["js/*.js"]
watch = ["js/**/*.js"]

[serve]
reload_cmd = "touch {root}/.reload"
"#,
    )?;

    let cfg = load_and_validate(&path)?;
    assert_eq!(cfg.paths().output, PathBuf::from("dist"));
    assert_eq!(cfg.style().sources, vec!["less/*.less"]);
    assert_eq!(cfg.style().post_process.len(), 1);
    assert_eq!(cfg.style().post_process[0].name, "minify");
    // Defaults fill what the file leaves out.
    assert_eq!(cfg.style().artifact_extension, "css");
    assert_eq!(cfg.script().artifact_extension, "js");
    assert_eq!(
        cfg.serve().reload_cmd.as_deref(),
        Some("touch {root}/.reload")
    );
    Ok(())
}

#[test]
fn missing_project_file_yields_defaults() -> TestResult {
    init_tracing();

    let dir = tempdir()?;
    let cfg = load_or_default(dir.path().join("Assetpipe.toml"))?;
    let defaults = ConfigFile::default();

    assert_eq!(cfg.paths().output, defaults.paths().output);
    assert_eq!(cfg.style().sources, vec!["styles/*.less"]);
    assert_eq!(cfg.style().watch, vec!["styles/**/*.less"]);
    let names: Vec<_> = cfg
        .style()
        .post_process
        .iter()
        .map(|s| s.name.as_str())
        .collect();
    assert_eq!(names, ["autoprefix", "purge", "minify"]);
    assert!(cfg.serve().reload_cmd.is_none());
    Ok(())
}

#[test]
fn malformed_toml_is_a_toml_error() -> TestResult {
    init_tracing();

    let dir = tempdir()?;
    let path = dir.path().join("Assetpipe.toml");
    fs::write(&path, "[style\nsources = 3")?;

    let err = load_and_validate(&path).unwrap_err();
    assert!(matches!(err, AssetpipeError::TomlError(_)), "got {err:?}");
    Ok(())
}

fn config_error(builder: ConfigFileBuilder) -> String {
    match ConfigFile::try_from(builder.raw()) {
        Err(AssetpipeError::ConfigError(msg)) => msg,
        other => panic!("expected a config error, got {other:?}"),
    }
}

#[test]
fn compiler_without_placeholders_is_rejected() {
    init_tracing();

    let msg = config_error(ConfigFileBuilder::new().compiler("lessc styles/site.less"));
    assert!(msg.contains("{input}"), "{msg}");
}

#[test]
fn duplicate_post_process_names_are_rejected() {
    init_tracing();

    let msg = config_error(ConfigFileBuilder::new().post_process(&[
        ("minify", "a {input} {output}"),
        ("minify", "b {input} {output}"),
    ]));
    assert!(msg.contains("more than once"), "{msg}");
}

#[test]
fn invalid_glob_is_rejected() {
    init_tracing();

    let msg = config_error(ConfigFileBuilder::new().style_sources(&["styles/[*.less"]));
    assert!(msg.contains("[style].sources"), "{msg}");
}

#[test]
fn empty_source_list_is_rejected() {
    init_tracing();

    let msg = config_error(ConfigFileBuilder::new().script_sources(&[]));
    assert!(msg.contains("[script].sources"), "{msg}");
}

#[test]
fn staging_must_differ_from_output() {
    init_tracing();

    let msg = config_error(ConfigFileBuilder::new().output("build").staging("build"));
    assert!(msg.contains("staging"), "{msg}");
}

#[test]
fn staging_spelled_as_the_output_is_rejected() {
    init_tracing();

    let msg = config_error(
        ConfigFileBuilder::new()
            .output("public/assets")
            .staging("./public/assets"),
    );
    assert!(msg.contains("overlaps"), "{msg}");

    let msg = config_error(
        ConfigFileBuilder::new()
            .output("public/assets")
            .staging("public/../public/assets/"),
    );
    assert!(msg.contains("overlaps"), "{msg}");
}

#[test]
fn staging_containing_or_inside_the_output_is_rejected() {
    init_tracing();

    for staging in ["public", "public/assets/tmp"] {
        let msg = config_error(ConfigFileBuilder::new().output("public/assets").staging(staging));
        assert!(msg.contains("overlaps"), "{staging}: {msg}");
    }

    let msg = config_error(ConfigFileBuilder::new().output("build/assets").staging("build"));
    assert!(msg.contains("overlaps"), "{msg}");
}

#[test]
fn staging_at_or_above_the_root_is_rejected() {
    init_tracing();

    for staging in ["", ".", "..", "styles/../..", "./"] {
        let msg = config_error(ConfigFileBuilder::new().staging(staging));
        assert!(msg.contains("project root"), "{staging:?}: {msg}");
    }
}

#[test]
fn absolute_staging_is_checked_against_the_real_root() -> TestResult {
    init_tracing();

    let cfg = ConfigFile::try_from(ConfigFileBuilder::new().staging("/proj").raw())?;
    let err = PipelineSpec::for_kind(PipelineKind::Style, &cfg, Path::new("/proj"), BuildMode::Release)
        .unwrap_err();
    assert!(matches!(err, AssetpipeError::ConfigError(_)), "got {err:?}");

    let cfg = ConfigFile::try_from(ConfigFileBuilder::new().staging("/proj/public").raw())?;
    assert!(
        PipelineSpec::for_kind(PipelineKind::Style, &cfg, Path::new("/proj"), BuildMode::Watch)
            .is_err()
    );

    let cfg = ConfigFile::try_from(ConfigFileBuilder::new().staging("/tmp/assetpipe-stage").raw())?;
    PipelineSpec::for_kind(PipelineKind::Style, &cfg, Path::new("/proj"), BuildMode::Watch)?;
    Ok(())
}

#[test]
fn nested_staging_outside_the_output_is_accepted() -> TestResult {
    let cfg = ConfigFile::try_from(
        ConfigFileBuilder::new()
            .output("public/assets")
            .staging(".assetpipe/staging/style")
            .raw(),
    )?;
    assert_eq!(cfg.style().staging, PathBuf::from(".assetpipe/staging/style"));
    Ok(())
}

#[test]
fn project_root_is_the_config_parent() {
    assert_eq!(
        project_root(Path::new("web/Assetpipe.toml")),
        PathBuf::from("web")
    );
    assert!(project_root(Path::new("Assetpipe.toml")).is_absolute());
}
