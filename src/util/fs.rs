//! Filesystem utilities.
//!
//! Resolution never touches `std::fs` directly. Every existence check and
//! directory scan goes through the [`FileSystem`] trait so that the resolver
//! can run against an in-memory tree in tests.

use std::fs;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use glob::Pattern;
use walkdir::WalkDir;

/// Read-only view of a directory tree.
pub trait FileSystem {
    /// Check if a path is a directory.
    fn is_dir(&self, path: &Path) -> bool;

    /// Check if a path is a regular file.
    fn is_file(&self, path: &Path) -> bool;

    /// Find files under `dir` whose file name matches any of `patterns`.
    ///
    /// `max_depth` counts subdirectory levels below `dir`: `Some(0)` only
    /// looks at files directly inside `dir`. Results are sorted.
    fn find_files(&self, dir: &Path, patterns: &[Pattern], max_depth: Option<usize>)
        -> Vec<PathBuf>;

    /// Read a file to string.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;
}

/// The real, on-disk filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealFs;

impl FileSystem for RealFs {
    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn find_files(
        &self,
        dir: &Path,
        patterns: &[Pattern],
        max_depth: Option<usize>,
    ) -> Vec<PathBuf> {
        let mut walker = WalkDir::new(dir).sort_by_file_name();
        if let Some(depth) = max_depth {
            walker = walker.max_depth(depth + 1);
        }

        let mut results = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("walk error under {}: {}", dir.display(), e);
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let name = entry.file_name().to_string_lossy();
            if patterns.iter().any(|p| p.matches(&name)) {
                results.push(entry.into_path());
            }
        }

        results.sort();
        results
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }
}

/// Lexically normalize a path: drop `.` components and fold `..` into the
/// preceding component. Does not touch the filesystem.
pub fn clean_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = match out.components().next_back() {
                    Some(Component::Normal(_)) => out.pop(),
                    _ => false,
                };
                if !popped && !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Canonicalize a path, but don't fail if it doesn't exist yet.
/// Returns the path as-is if canonicalization fails.
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// Get the relative path from `base` to `path`.
pub fn relative_path(base: &Path, path: &Path) -> PathBuf {
    pathdiff::diff_paths(path, base).unwrap_or_else(|| path.to_path_buf())
}

/// Render a path the way CMake expects it: forward slashes only.
pub fn cmake_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Write a file atomically: contents go to a temporary file in the same
/// directory which is then renamed over the destination.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));

    fs::create_dir_all(parent)
        .with_context(|| format!("failed to create directory: {}", parent.display()))?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent)
        .with_context(|| format!("failed to create temporary file in {}", parent.display()))?;
    tmp.write_all(contents.as_bytes())
        .with_context(|| format!("failed to write file: {}", path.display()))?;
    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("failed to write file: {}", path.display()))?;

    Ok(())
}
