//! Library probe: classify a third-party directory by its marker files.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use glob::Pattern;
use serde::{Deserialize, Serialize};

use crate::core::{ProjectDescriptor, PROJECT_FILE};
use crate::resolver::errors::ResolveError;
use crate::util::FileSystem;

/// File name patterns that mark a CMake package config.
const CONFIG_PATTERNS: &[&str] = &["*Config.cmake", "*-config.cmake"];

/// How a third-party library is brought into the build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResolutionMode {
    /// `Find<Name>.cmake` in the library directory
    Module,
    /// `*Config.cmake` somewhere under the library directory
    Config,
    /// `CMakeLists.txt` in the library directory
    Source,
    /// `Project.json` in the library directory
    Project,
}

impl fmt::Display for ResolutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionMode::Module => write!(f, "MODULE"),
            ResolutionMode::Config => write!(f, "CONFIG"),
            ResolutionMode::Source => write!(f, "SOURCE"),
            ResolutionMode::Project => write!(f, "PROJECT"),
        }
    }
}

/// A resolved third-party library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryNode {
    /// Dependency name as declared
    pub name: String,
    /// Directory the library was found in (its identity)
    pub dir: PathBuf,
    /// How the library is brought in
    pub mode: ResolutionMode,
    /// Directory holding the package config for `Config` mode, otherwise `dir`
    pub location: PathBuf,
    /// Embedded descriptor, only for `Project` mode
    pub project: Option<Arc<ProjectDescriptor>>,
}

impl LibraryNode {
    /// Attach the recursively loaded descriptor of a `Project` mode library.
    pub fn with_project(mut self, descriptor: Arc<ProjectDescriptor>) -> Self {
        self.project = Some(descriptor);
        self
    }

    /// Whether two nodes for the same directory resolved identically.
    pub fn same_resolution(&self, other: &LibraryNode) -> bool {
        self.dir == other.dir && self.mode == other.mode && self.location == other.location
    }
}

/// Probes candidate directories for a library.
pub struct LibraryProbe<'a> {
    fs: &'a dyn FileSystem,
    config_patterns: Vec<Pattern>,
    config_depth: Option<usize>,
}

impl<'a> LibraryProbe<'a> {
    /// Create a probe over a filesystem.
    pub fn new(fs: &'a dyn FileSystem) -> Self {
        LibraryProbe {
            fs,
            config_patterns: CONFIG_PATTERNS
                .iter()
                .filter_map(|p| Pattern::new(p).ok())
                .collect(),
            config_depth: None,
        }
    }

    /// Limit how deep config files are searched for.
    pub fn with_config_depth(mut self, depth: Option<usize>) -> Self {
        self.config_depth = depth;
        self
    }

    /// Resolve `name` against `candidates`.
    ///
    /// The first candidate that exists as a directory is the only one
    /// classified; later candidates are never consulted. `consumer` is the
    /// name of the declaring project and only used for error reporting.
    pub fn probe(
        &self,
        name: &str,
        candidates: &[PathBuf],
        consumer: &str,
    ) -> Result<LibraryNode, ResolveError> {
        let unresolved = || ResolveError::DependencyUnresolved {
            name: name.to_string(),
            consumer: consumer.to_string(),
            searched: candidates.to_vec(),
        };

        if name.trim().is_empty() || name.contains(['/', '\\']) {
            return Err(unresolved());
        }

        let dir = candidates
            .iter()
            .find(|dir| self.fs.is_dir(dir))
            .ok_or_else(unresolved)?;

        let (mode, location) = self.classify(name, dir).ok_or_else(unresolved)?;
        tracing::debug!("Resolved `{}` as {} at {}", name, mode, dir.display());

        Ok(LibraryNode {
            name: name.to_string(),
            dir: dir.clone(),
            mode,
            location,
            project: None,
        })
    }

    /// Apply the resolution rules to one directory, in priority order.
    pub fn classify(&self, name: &str, dir: &Path) -> Option<(ResolutionMode, PathBuf)> {
        if self.fs.is_file(&dir.join(format!("Find{}.cmake", name))) {
            return Some((ResolutionMode::Module, dir.to_path_buf()));
        }

        let configs = self
            .fs
            .find_files(dir, &self.config_patterns, self.config_depth);
        if let Some(config) = configs.first() {
            let location = config.parent().unwrap_or(dir).to_path_buf();
            return Some((ResolutionMode::Config, location));
        }

        if self.fs.is_file(&dir.join("CMakeLists.txt")) {
            return Some((ResolutionMode::Source, dir.to_path_buf()));
        }

        if self.fs.is_file(&dir.join(PROJECT_FILE)) {
            return Some((ResolutionMode::Project, dir.to_path_buf()));
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockFileSystem;

    fn candidates() -> Vec<PathBuf> {
        vec![
            PathBuf::from("/ws/LibA/3rdparty/fmt"),
            PathBuf::from("/ws/3rdparty/fmt"),
        ]
    }

    fn probe(fs: &MockFileSystem) -> Result<LibraryNode, ResolveError> {
        LibraryProbe::new(fs).probe("fmt", &candidates(), "LibA")
    }

    #[test]
    fn test_module_mode_outranks_everything() {
        let mut fs = MockFileSystem::new();
        fs.add_file("/ws/3rdparty/fmt/Findfmt.cmake", "");
        fs.add_file("/ws/3rdparty/fmt/fmtConfig.cmake", "");
        fs.add_file("/ws/3rdparty/fmt/CMakeLists.txt", "");
        fs.add_file("/ws/3rdparty/fmt/Project.json", "{}");

        let node = probe(&fs).unwrap();
        assert_eq!(node.mode, ResolutionMode::Module);
        assert_eq!(node.dir, PathBuf::from("/ws/3rdparty/fmt"));
    }

    #[test]
    fn test_empty_name_is_unresolved() {
        let mut fs = MockFileSystem::new();
        fs.add_file("/ws/3rdparty/fmt/lib/cmake/fmt/fmtConfig.cmake", "");

        let candidates = vec![PathBuf::from("/ws/LibA/3rdparty/"), PathBuf::from("/ws/3rdparty/")];
        let err = LibraryProbe::new(&fs).probe("", &candidates, "LibA").unwrap_err();
        assert!(matches!(err, ResolveError::DependencyUnresolved { .. }));
    }

    #[test]
    fn test_module_name_is_case_sensitive() {
        let mut fs = MockFileSystem::new();
        fs.add_file("/ws/3rdparty/fmt/FindFMT.cmake", "");
        fs.add_file("/ws/3rdparty/fmt/CMakeLists.txt", "");

        assert_eq!(probe(&fs).unwrap().mode, ResolutionMode::Source);
    }

    #[test]
    fn test_config_mode_searches_recursively() {
        let mut fs = MockFileSystem::new();
        fs.add_file("/ws/3rdparty/fmt/lib/cmake/fmt/fmtConfig.cmake", "");
        fs.add_file("/ws/3rdparty/fmt/CMakeLists.txt", "");

        let node = probe(&fs).unwrap();
        assert_eq!(node.mode, ResolutionMode::Config);
        assert_eq!(node.location, PathBuf::from("/ws/3rdparty/fmt/lib/cmake/fmt"));
    }

    #[test]
    fn test_config_mode_accepts_lowercase_form() {
        let mut fs = MockFileSystem::new();
        fs.add_file("/ws/3rdparty/fmt/share/fmt-config.cmake", "");

        assert_eq!(probe(&fs).unwrap().mode, ResolutionMode::Config);
    }

    #[test]
    fn test_config_depth_limit() {
        let mut fs = MockFileSystem::new();
        fs.add_file("/ws/3rdparty/fmt/lib/cmake/fmt/fmtConfig.cmake", "");
        fs.add_file("/ws/3rdparty/fmt/CMakeLists.txt", "");

        let node = LibraryProbe::new(&fs)
            .with_config_depth(Some(1))
            .probe("fmt", &candidates(), "LibA")
            .unwrap();
        assert_eq!(node.mode, ResolutionMode::Source);
    }

    #[test]
    fn test_source_outranks_project() {
        let mut fs = MockFileSystem::new();
        fs.add_file("/ws/3rdparty/fmt/CMakeLists.txt", "");
        fs.add_file("/ws/3rdparty/fmt/Project.json", "{}");

        assert_eq!(probe(&fs).unwrap().mode, ResolutionMode::Source);
    }

    #[test]
    fn test_project_mode() {
        let mut fs = MockFileSystem::new();
        fs.add_file("/ws/3rdparty/fmt/Project.json", "{}");

        assert_eq!(probe(&fs).unwrap().mode, ResolutionMode::Project);
    }

    #[test]
    fn test_first_existing_candidate_wins_without_merging() {
        let mut fs = MockFileSystem::new();
        fs.add_dir("/ws/LibA/3rdparty/fmt");
        fs.add_file("/ws/3rdparty/fmt/CMakeLists.txt", "");

        let err = probe(&fs).unwrap_err();
        assert!(matches!(err, ResolveError::DependencyUnresolved { .. }));
    }

    #[test]
    fn test_project_local_candidate_preferred() {
        let mut fs = MockFileSystem::new();
        fs.add_file("/ws/LibA/3rdparty/fmt/CMakeLists.txt", "");
        fs.add_file("/ws/3rdparty/fmt/Findfmt.cmake", "");

        let node = probe(&fs).unwrap();
        assert_eq!(node.mode, ResolutionMode::Source);
        assert_eq!(node.dir, PathBuf::from("/ws/LibA/3rdparty/fmt"));
    }

    #[test]
    fn test_unresolved_carries_searched_paths() {
        let fs = MockFileSystem::new();

        match probe(&fs).unwrap_err() {
            ResolveError::DependencyUnresolved {
                name,
                consumer,
                searched,
            } => {
                assert_eq!(name, "fmt");
                assert_eq!(consumer, "LibA");
                assert_eq!(searched, candidates());
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
