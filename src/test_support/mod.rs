//! Test utilities and mocks for cmakegen unit tests.
//!
//! The resolver only sees the filesystem through [`FileSystem`], so most
//! tests build an in-memory tree with [`MockFileSystem`] and write
//! descriptors into it with the helpers in [`fixtures`].
//!
//! # Example
//!
//! ```rust,ignore
//! use cmakegen::test_support::{MockFileSystem, ProjectFixture};
//!
//! let mut fs = MockFileSystem::new();
//! ProjectFixture::new("LibA").third_party(&["fmt"]).write(&mut fs, "/ws/LibA");
//! fs.add_file("/ws/3rdparty/fmt/CMakeLists.txt", "");
//! ```

pub mod fixtures;

use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};

use glob::Pattern;

use crate::util::FileSystem;

pub use fixtures::*;

/// In-memory filesystem for tests.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    files: BTreeMap<PathBuf, String>,
    dirs: BTreeSet<PathBuf>,
}

impl MockFileSystem {
    /// Create a new empty mock filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file with the given content, creating parent directories.
    pub fn add_file(&mut self, path: impl AsRef<Path>, content: impl Into<String>) {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            self.add_dir(parent);
        }
        self.files.insert(path, content.into());
    }

    /// Add a directory and all of its parents.
    pub fn add_dir(&mut self, path: impl AsRef<Path>) {
        for ancestor in path.as_ref().ancestors() {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            self.dirs.insert(ancestor.to_path_buf());
        }
    }
}

impl FileSystem for MockFileSystem {
    fn is_dir(&self, path: &Path) -> bool {
        self.dirs.contains(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    fn find_files(
        &self,
        dir: &Path,
        patterns: &[Pattern],
        max_depth: Option<usize>,
    ) -> Vec<PathBuf> {
        self.files
            .keys()
            .filter(|path| {
                let Ok(relative) = path.strip_prefix(dir) else {
                    return false;
                };
                let depth = relative.components().count().saturating_sub(1);
                if max_depth.is_some_and(|max| depth > max) {
                    return false;
                }
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy())
                    .unwrap_or_default();
                patterns.iter().any(|p| p.matches(&name))
            })
            .cloned()
            .collect()
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("file not found: {}", path.display()),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_fs_dirs_and_files() {
        let mut fs = MockFileSystem::new();
        fs.add_file("/ws/LibA/src/a.cpp", "int a;");

        assert!(fs.is_dir(Path::new("/ws/LibA/src")));
        assert!(fs.is_dir(Path::new("/ws")));
        assert!(fs.is_file(Path::new("/ws/LibA/src/a.cpp")));
        assert!(!fs.is_dir(Path::new("/ws/LibA/src/a.cpp")));
        assert_eq!(
            fs.read_to_string(Path::new("/ws/LibA/src/a.cpp")).unwrap(),
            "int a;"
        );
        assert!(fs.read_to_string(Path::new("/ws/missing")).is_err());
    }

    #[test]
    fn test_mock_find_files_depth() {
        let mut fs = MockFileSystem::new();
        fs.add_file("/d/top.cpp", "");
        fs.add_file("/d/a/b/deep.cpp", "");
        fs.add_file("/d/a/b/deep.txt", "");
        let patterns = vec![Pattern::new("*.cpp").unwrap()];

        assert_eq!(fs.find_files(Path::new("/d"), &patterns, None).len(), 2);
        assert_eq!(
            fs.find_files(Path::new("/d"), &patterns, Some(0)),
            vec![PathBuf::from("/d/top.cpp")]
        );
    }
}
