// src/pipeline/staging.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, warn};

use crate::fs::FileSystem;

/// Scoped staging directory for one pipeline invocation.
///
/// Call [`StagingDir::release`] on every exit path; `Drop` removes the
/// directory too if the owner was cancelled or panicked first.
#[derive(Debug)]
pub struct StagingDir {
    path: PathBuf,
    fs: Arc<dyn FileSystem>,
    released: bool,
}

impl StagingDir {
    /// Create a fresh, empty staging directory at `path`.
    ///
    /// Leftovers from a crashed earlier process are removed first.
    pub fn acquire(fs: Arc<dyn FileSystem>, path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if fs.exists(&path) {
            warn!(?path, "removing stale staging directory");
            fs.remove_dir_all(&path)?;
        }
        fs.create_dir_all(&path)?;
        debug!(?path, "staging directory acquired");

        Ok(Self {
            path,
            fs,
            released: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn release(mut self) -> Result<()> {
        self.released = true;
        self.remove()
    }

    fn remove(&self) -> Result<()> {
        if self.fs.exists(&self.path) {
            self.fs.remove_dir_all(&self.path)?;
            debug!(path = ?self.path, "staging directory removed");
        }
        Ok(())
    }
}

impl Drop for StagingDir {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(err) = self.remove() {
            warn!(path = ?self.path, error = %err, "failed to remove staging directory");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    #[test]
    fn dropping_without_release_still_cleans_up() {
        let fs = Arc::new(MockFileSystem::new());
        {
            let staging = StagingDir::acquire(fs.clone(), "/proj/.stage").unwrap();
            fs.add_file(staging.path().join("site.css"), b"body{}");
        }
        assert!(!fs.exists(Path::new("/proj/.stage")));
    }

    #[test]
    fn acquire_clears_leftovers() {
        let fs = Arc::new(MockFileSystem::new());
        fs.add_file("/proj/.stage/old.css", b"stale");

        let staging = StagingDir::acquire(fs.clone(), "/proj/.stage").unwrap();

        assert!(fs.is_dir(staging.path()));
        assert!(!fs.exists(Path::new("/proj/.stage/old.css")));
        staging.release().unwrap();
        assert!(!fs.exists(Path::new("/proj/.stage")));
    }
}
