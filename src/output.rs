// src/output.rs

//! Output directory management.
//!
//! The output directory is created lazily and never deleted here; only
//! single stale artifacts are removed when their source goes away.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info};

use crate::fs::FileSystem;

#[derive(Debug, Clone)]
pub struct OutputDir {
    path: PathBuf,
    fs: Arc<dyn FileSystem>,
}

impl OutputDir {
    pub fn new(path: impl Into<PathBuf>, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            path: path.into(),
            fs,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the directory if absent. Calling it again is a no-op.
    pub fn ensure(&self) -> Result<()> {
        if self.fs.is_dir(&self.path) {
            return Ok(());
        }
        self.fs.create_dir_all(&self.path)?;
        debug!(path = ?self.path, "created output directory");
        Ok(())
    }

    /// Where the artifact derived from `source` lives: its base name with
    /// the extension replaced by `extension`.
    pub fn artifact_path(&self, source: &Path, extension: &str) -> Option<PathBuf> {
        artifact_name(source, extension).map(|name| self.path.join(name))
    }

    /// Best-effort removal of the artifact derived from `source`.
    ///
    /// Returns the removed path, or `None` if there was nothing to remove.
    pub fn remove_artifact(&self, source: &Path, extension: &str) -> Result<Option<PathBuf>> {
        let Some(artifact) = self.artifact_path(source, extension) else {
            return Ok(None);
        };

        if !self.fs.is_file(&artifact) {
            debug!(?artifact, "artifact already absent");
            return Ok(None);
        }

        match self.fs.remove_file(&artifact) {
            Ok(()) => {
                info!(?artifact, "removed stale artifact");
                Ok(Some(artifact))
            }
            // Lost a race with another deleter: still idempotent.
            Err(_) if !self.fs.exists(&artifact) => Ok(None),
            Err(err) => Err(err),
        }
    }
}

/// `styles/site.less` + `css` → `site.css`.
pub fn artifact_name(source: &Path, extension: &str) -> Option<String> {
    let stem = source.file_stem()?.to_str()?;
    Some(format!("{stem}.{extension}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_name_uses_base_name_only() {
        assert_eq!(
            artifact_name(Path::new("styles/nested/site.less"), "css").as_deref(),
            Some("site.css")
        );
        assert_eq!(
            artifact_name(Path::new("scripts/app.ts"), "js").as_deref(),
            Some("app.js")
        );
        assert_eq!(artifact_name(Path::new(""), "css"), None);
    }
}
