use std::path::{Path, PathBuf};

use assetpipe::config::{ConfigFile, PostProcessStep, RawConfigFile};

/// Builder for `ConfigFile` to simplify test setup.
///
/// Starts from the project defaults; every setter replaces one field.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn output(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.paths.output = dir.into();
        self
    }

    pub fn style_sources(mut self, patterns: &[&str]) -> Self {
        self.config.style.sources = to_strings(patterns);
        self
    }

    pub fn style_watch(mut self, patterns: &[&str]) -> Self {
        self.config.style.watch = to_strings(patterns);
        self
    }

    pub fn staging(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.style.staging = dir.into();
        self
    }

    pub fn compiler(mut self, cmd: &str) -> Self {
        self.config.style.compiler = cmd.to_string();
        self
    }

    /// Replace the whole post-processing chain with `(name, cmd)` pairs.
    pub fn post_process(mut self, steps: &[(&str, &str)]) -> Self {
        self.config.style.post_process = steps
            .iter()
            .map(|(name, cmd)| PostProcessStep::new(*name, *cmd))
            .collect();
        self
    }

    pub fn script_sources(mut self, patterns: &[&str]) -> Self {
        self.config.script.sources = to_strings(patterns);
        self
    }

    pub fn script_watch(mut self, patterns: &[&str]) -> Self {
        self.config.script.watch = to_strings(patterns);
        self
    }

    pub fn reload_cmd(mut self, cmd: &str) -> Self {
        self.config.serve.reload_cmd = Some(cmd.to_string());
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn to_strings(patterns: &[&str]) -> Vec<String> {
    patterns.iter().map(|p| p.to_string()).collect()
}

/// Create `root/rel` (and its parents) with `contents` on the real disk.
pub fn write_file(root: &Path, rel: &str, contents: &str) -> PathBuf {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create parent dirs");
    }
    std::fs::write(&path, contents).expect("write test file");
    path
}
