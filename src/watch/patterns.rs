// src/watch/patterns.rs

use std::fmt;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use crate::fs::FileSystem;

/// Compiled source patterns for one pipeline.
///
/// - `direct` matches the flat source files that each produce one artifact
///   (e.g. `styles/*.less`).
/// - `watch` matches everything whose change should trigger a recompile,
///   nested partials included (e.g. `styles/**/*.less`).
///
/// Patterns are relative to the project root; callers pass relative paths
/// with forward slashes (e.g. `"styles/site.less"`).
#[derive(Clone)]
pub struct SourcePatterns {
    direct_patterns: Vec<String>,
    watch_patterns: Vec<String>,
    direct: GlobSet,
    watch: GlobSet,
}

impl fmt::Debug for SourcePatterns {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourcePatterns")
            .field("direct", &self.direct_patterns)
            .field("watch", &self.watch_patterns)
            .finish_non_exhaustive()
    }
}

impl SourcePatterns {
    pub fn new(direct: &[String], watch: &[String]) -> Result<Self> {
        Ok(Self {
            direct_patterns: direct.to_vec(),
            watch_patterns: watch.to_vec(),
            direct: build_globset(direct).context("building direct source globset")?,
            watch: build_globset(watch).context("building watch globset")?,
        })
    }

    pub fn is_direct(&self, rel_path: &str) -> bool {
        self.direct.is_match(rel_path)
    }

    /// Direct sources always count as watched, even if the watch list forgot
    /// them.
    pub fn is_watched(&self, rel_path: &str) -> bool {
        self.watch.is_match(rel_path) || self.direct.is_match(rel_path)
    }

    /// Directories under `root` to register with the OS watcher.
    ///
    /// A directory already covered by a recursive watch on one of its
    /// ancestors is dropped.
    pub fn watch_roots(&self, root: &Path) -> Vec<PathBuf> {
        let mut roots: Vec<PathBuf> = self
            .watch_patterns
            .iter()
            .chain(self.direct_patterns.iter())
            .map(|p| join_base(root, p))
            .collect();
        roots.sort();
        roots.dedup();

        let mut kept: Vec<PathBuf> = Vec::new();
        for dir in roots {
            if !kept.iter().any(|k| dir.starts_with(k)) {
                kept.push(dir);
            }
        }
        kept
    }

    /// Every existing direct source under `root`.
    pub fn direct_sources(&self, fs: &dyn FileSystem, root: &Path) -> Result<Vec<PathBuf>> {
        collect_matching_files(fs, root, &self.direct_patterns, &self.direct)
    }
}

/// Build a GlobSet where `*` never crosses a `/`, so `styles/*.less` stays
/// flat and only `**` descends.
pub fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = GlobBuilder::new(pat)
            .literal_separator(true)
            .build()
            .with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

/// Longest leading run of path components without glob metacharacters.
///
/// `styles/**/*.less` → `styles`; `*.less` → `.` (the root itself).
pub fn glob_base(pattern: &str) -> PathBuf {
    let mut base = PathBuf::new();
    for component in Path::new(pattern).components() {
        let Component::Normal(part) = component else {
            continue;
        };
        let part = part.to_string_lossy();
        if part.contains(['*', '?', '[', ']', '{', '}']) {
            break;
        }
        base.push(part.as_ref());
    }

    // The last literal component of a pattern without wildcards is a file.
    if !pattern.contains(['*', '?', '[', ']', '{', '}']) {
        base.pop();
    }

    if base.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        base
    }
}

/// Absolute (or root-relative) directory holding the literal base of
/// `pattern`.
pub fn join_base(root: &Path, pattern: &str) -> PathBuf {
    let base = glob_base(pattern);
    if base == Path::new(".") {
        root.to_path_buf()
    } else {
        root.join(base)
    }
}

/// Convert a path under `root` to the relative, forward-slash form globs
/// are matched against.
///
/// Falls back to comparing canonical paths, since watchers on some platforms
/// report a different absolute prefix (symlinked temp dirs on macOS).
/// Deleted paths cannot be canonicalized, so the direct prefix is tried first.
pub fn relative_to(root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        return Some(rel.to_string_lossy().replace('\\', "/"));
    }

    let root_canon = root.canonicalize().ok()?;
    let path_canon = path.canonicalize().ok()?;
    let rel = path_canon.strip_prefix(&root_canon).ok()?;
    Some(rel.to_string_lossy().replace('\\', "/"))
}

/// Collect all files under `root` matching `set`, sorted.
///
/// Only the literal base directories of `patterns` are walked, so unrelated
/// trees (`node_modules`, output dirs) are never read.
pub fn collect_matching_files(
    fs: &dyn FileSystem,
    root: &Path,
    patterns: &[String],
    set: &GlobSet,
) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut stack: Vec<PathBuf> = patterns
        .iter()
        .map(|p| join_base(root, p))
        .filter(|dir| fs.is_dir(dir))
        .collect();
    stack.sort();
    stack.dedup();

    let mut visited = std::collections::HashSet::new();
    while let Some(dir) = stack.pop() {
        if !visited.insert(dir.clone()) {
            continue;
        }
        for path in fs.read_dir(&dir)? {
            if fs.is_dir(&path) {
                stack.push(path);
            } else if fs.is_file(&path) {
                if let Some(rel) = relative_to(root, &path) {
                    if set.is_match(&rel) {
                        files.push(path);
                    }
                }
            }
        }
    }

    files.sort();
    files.dedup();
    Ok(files)
}
