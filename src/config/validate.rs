// src/config/validate.rs

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use crate::config::model::{ConfigFile, PostProcessStep, RawConfigFile};
use crate::errors::{AssetpipeError, Result};
use crate::watch::patterns::build_globset;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::AssetpipeError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

pub fn validate_config(cfg: &RawConfigFile) -> Result<()> {
    validate_patterns("style", &cfg.style.sources, &cfg.style.watch)?;
    validate_patterns("script", &cfg.script.sources, &cfg.script.watch)?;
    validate_template("[style].compiler", &cfg.style.compiler)?;
    validate_post_process(&cfg.style.post_process)?;
    validate_extension("style", &cfg.style.artifact_extension)?;
    validate_extension("script", &cfg.script.artifact_extension)?;
    validate_directories(cfg)?;
    Ok(())
}

fn validate_patterns(section: &str, sources: &[String], watch: &[String]) -> Result<()> {
    if sources.is_empty() {
        return Err(config_error(format!("[{section}].sources must not be empty")));
    }
    if watch.is_empty() {
        return Err(config_error(format!("[{section}].watch must not be empty")));
    }

    build_globset(sources)
        .map_err(|e| config_error(format!("[{section}].sources: {e:#}")))?;
    build_globset(watch).map_err(|e| config_error(format!("[{section}].watch: {e:#}")))?;
    Ok(())
}

fn validate_template(field: &str, template: &str) -> Result<()> {
    for placeholder in ["{input}", "{output}"] {
        if !template.contains(placeholder) {
            return Err(config_error(format!(
                "{field} must contain the {placeholder} placeholder (got \"{template}\")"
            )));
        }
    }
    Ok(())
}

fn validate_post_process(steps: &[PostProcessStep]) -> Result<()> {
    let mut seen = HashSet::new();
    for step in steps {
        if step.name.trim().is_empty() {
            return Err(config_error(
                "[[style.post_process]] entries need a non-empty name".to_string(),
            ));
        }
        if !seen.insert(step.name.as_str()) {
            return Err(config_error(format!(
                "post-process step '{}' is defined more than once",
                step.name
            )));
        }
        validate_template(&format!("post-process step '{}'", step.name), &step.cmd)?;
    }
    Ok(())
}

fn validate_extension(section: &str, ext: &str) -> Result<()> {
    if ext.is_empty() || ext.starts_with('.') {
        return Err(config_error(format!(
            "[{section}].artifact_extension must be non-empty and without a leading dot (got \"{ext}\")"
        )));
    }
    Ok(())
}

fn validate_directories(cfg: &RawConfigFile) -> Result<()> {
    check_staging_dir(Path::new(""), &cfg.style.staging, &cfg.paths.output)
}

/// Staging is wiped on every invocation, so it must not be, contain or sit
/// inside the output directory, and must not be the project root or above
/// it.
///
/// Paths are compared lexically after joining onto `root`. An empty `root`
/// checks the project file on its own; the pipeline repeats the check
/// against the real root.
pub(crate) fn check_staging_dir(root: &Path, staging: &Path, output: &Path) -> Result<()> {
    let root = normalize(root);
    let staged = normalize(&root.join(staging));
    let out = normalize(&root.join(output));

    let above_root = staged.components().all(|c| c == Component::ParentDir);
    if above_root || root.starts_with(&staged) {
        return Err(config_error(format!(
            "[style].staging {staging:?} resolves to the project root or one of its parents"
        )));
    }
    if out.starts_with(&staged) || staged.starts_with(&out) {
        return Err(config_error(format!(
            "[style].staging {staging:?} overlaps [paths].output {output:?}"
        )));
    }
    Ok(())
}

/// Resolve `.` and `..` without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}

fn config_error(msg: String) -> AssetpipeError {
    AssetpipeError::ConfigError(msg)
}
