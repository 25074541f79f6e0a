// src/watch/cache.rs

use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use blake3::Hasher;
use tracing::debug;

use crate::fs::FileSystem;

/// Compute the hash of a single file.
pub fn compute_file_hash(fs: &dyn FileSystem, path: &Path) -> Result<String> {
    let mut hasher = Hasher::new();
    let mut file = fs
        .open_read(path)
        .with_context(|| format!("opening file for hashing: {:?}", path))?;
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize().to_hex().to_string())
}

/// In-memory record of the last content hash seen per source file.
///
/// Used to drop `Change` notifications that did not change content (editors
/// and tools that only touch a file). Lives for the watch session only.
#[derive(Debug, Default)]
pub struct ContentCache {
    hashes: HashMap<PathBuf, String>,
}

impl ContentCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `hash` for `path`. Returns `true` if it differs from the
    /// previously recorded hash (or there was none).
    pub fn record(&mut self, path: &Path, hash: String) -> bool {
        if self.hashes.get(path) == Some(&hash) {
            debug!(?path, "content unchanged since last event");
            return false;
        }
        self.hashes.insert(path.to_path_buf(), hash);
        true
    }

    pub fn forget(&mut self, path: &Path) {
        if self.hashes.remove(path).is_some() {
            debug!(?path, "forgot cached content hash");
        }
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }
}
