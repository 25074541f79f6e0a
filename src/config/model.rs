// src/config/model.rs

use std::path::PathBuf;

use serde::Deserialize;

/// Top-level project file as read from TOML (`Assetpipe.toml`).
///
/// ```toml
/// [paths]
/// output = "public/assets"
///
/// [style]
/// sources = ["styles/*.less"]
/// watch = ["styles/**/*.less"]
/// compiler = "npx lessc {input} {output}"
///
/// [[style.post_process]]
/// name = "minify"
/// cmd = "npx postcss {input} --use cssnano --no-map --output {output}"
///
/// [serve]
/// reload_cmd = "npx browser-sync reload"
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub paths: PathsSection,

    #[serde(default)]
    pub style: StyleSection,

    #[serde(default)]
    pub script: ScriptSection,

    #[serde(default)]
    pub serve: ServeSection,
}

/// Validated configuration.
///
/// Only obtainable through `TryFrom<RawConfigFile>` (see `validate.rs`), so
/// holding one means the command templates and patterns are usable.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    paths: PathsSection,
    style: StyleSection,
    script: ScriptSection,
    serve: ServeSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            paths: raw.paths,
            style: raw.style,
            script: raw.script,
            serve: raw.serve,
        }
    }

    pub fn paths(&self) -> &PathsSection {
        &self.paths
    }

    pub fn style(&self) -> &StyleSection {
        &self.style
    }

    pub fn script(&self) -> &ScriptSection {
        &self.script
    }

    pub fn serve(&self) -> &ServeSection {
        &self.serve
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        ConfigFile::new_unchecked(RawConfigFile::default())
    }
}

/// `[paths]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct PathsSection {
    /// Single flat directory every artifact is written into.
    #[serde(default = "default_output")]
    pub output: PathBuf,
}

fn default_output() -> PathBuf {
    PathBuf::from("public/assets")
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            output: default_output(),
        }
    }
}

/// `[style]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct StyleSection {
    /// Direct (non-nested) sources; each one yields exactly one artifact.
    #[serde(default = "default_style_sources")]
    pub sources: Vec<String>,

    /// Patterns that trigger a recompile, including nested partials.
    #[serde(default = "default_style_watch")]
    pub watch: Vec<String>,

    #[serde(default = "default_style_staging")]
    pub staging: PathBuf,

    /// Compiler template, run once per source file.
    #[serde(default = "default_style_compiler")]
    pub compiler: String,

    /// Ordered post-processing chain, applied in `Release` only.
    #[serde(default = "default_post_process")]
    pub post_process: Vec<PostProcessStep>,

    #[serde(default = "default_style_extension")]
    pub artifact_extension: String,
}

fn default_style_sources() -> Vec<String> {
    vec!["styles/*.less".to_string()]
}

fn default_style_watch() -> Vec<String> {
    vec!["styles/**/*.less".to_string()]
}

fn default_style_staging() -> PathBuf {
    PathBuf::from(".assetpipe/staging/style")
}

fn default_style_compiler() -> String {
    "npx lessc {input} {output}".to_string()
}

fn default_style_extension() -> String {
    "css".to_string()
}

/// Autoprefix, then purge unused selectors, then minify.
fn default_post_process() -> Vec<PostProcessStep> {
    vec![
        PostProcessStep::new(
            "autoprefix",
            "npx postcss {input} --use autoprefixer --no-map --output {output}",
        ),
        PostProcessStep::new(
            "purge",
            "npx postcss {input} --use @fullhuman/postcss-purgecss --no-map --output {output}",
        ),
        PostProcessStep::new(
            "minify",
            "npx postcss {input} --use cssnano --no-map --output {output}",
        ),
    ]
}

impl Default for StyleSection {
    fn default() -> Self {
        Self {
            sources: default_style_sources(),
            watch: default_style_watch(),
            staging: default_style_staging(),
            compiler: default_style_compiler(),
            post_process: default_post_process(),
            artifact_extension: default_style_extension(),
        }
    }
}

/// One `[[style.post_process]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PostProcessStep {
    pub name: String,
    pub cmd: String,
}

impl PostProcessStep {
    pub fn new(name: impl Into<String>, cmd: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cmd: cmd.into(),
        }
    }
}

/// `[script]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ScriptSection {
    #[serde(default = "default_script_sources")]
    pub sources: Vec<String>,

    #[serde(default = "default_script_watch")]
    pub watch: Vec<String>,

    #[serde(default = "default_script_extension")]
    pub artifact_extension: String,
}

fn default_script_sources() -> Vec<String> {
    vec!["scripts/*.ts".to_string(), "scripts/*.js".to_string()]
}

fn default_script_watch() -> Vec<String> {
    vec!["scripts/**/*.ts".to_string(), "scripts/**/*.js".to_string()]
}

fn default_script_extension() -> String {
    "js".to_string()
}

impl Default for ScriptSection {
    fn default() -> Self {
        Self {
            sources: default_script_sources(),
            watch: default_script_watch(),
            artifact_extension: default_script_extension(),
        }
    }
}

/// `[serve]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServeSection {
    /// Command run after each successful compile in `Serve` mode.
    #[serde(default)]
    pub reload_cmd: Option<String>,
}
