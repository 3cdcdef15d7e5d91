//! `Project.json` and `Solution.json` descriptors.
//!
//! Descriptors are loaded through a [`FileSystem`] so that resolution can be
//! exercised against an in-memory tree. Once loaded they are never mutated.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::util::FileSystem;

/// File name of a project descriptor.
pub const PROJECT_FILE: &str = "Project.json";

/// File name of a solution descriptor.
pub const SOLUTION_FILE: &str = "Solution.json";

static BRACE_VAR: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\$\{([A-Za-z0-9_]+)\}").ok());
static PERCENT_VAR: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"%([A-Za-z0-9_]+)%").ok());

/// Error loading a descriptor. Reported verbatim by the resolver.
#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("descriptor not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid descriptor {}: {reason}", path.display())]
    Invalid { path: PathBuf, reason: String },
}

/// Executable target settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutableSpec {
    /// Whether the executable is built
    #[serde(default = "default_true")]
    pub compile: bool,

    /// Source file containing `main`
    #[serde(default)]
    pub entry_file: Option<String>,
}

/// Library target settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibrarySpec {
    /// Whether the library is built
    #[serde(default = "default_true")]
    pub compile: bool,

    /// Static (true) or shared (false) library
    #[serde(default = "default_true", rename = "static")]
    pub is_static: bool,

    /// Install prefix, relative to the project. Its presence makes the
    /// library exportable.
    #[serde(default)]
    pub install_dir: Option<String>,

    /// Headers installed alongside the library
    #[serde(default)]
    pub export_headers: Vec<String>,
}

impl LibrarySpec {
    /// The install directory, if one is set and non-empty.
    pub fn install_dir(&self) -> Option<&str> {
        self.install_dir.as_deref().filter(|d| !d.trim().is_empty())
    }
}

fn default_true() -> bool {
    true
}

fn default_version() -> String {
    "1.0.0".to_string()
}

/// A parsed `Project.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDescriptor {
    /// Project name, unique within a solution
    pub name: String,

    /// Project version
    #[serde(default = "default_version")]
    pub version: String,

    /// Directories scanned for sources, relative to the project
    #[serde(default)]
    pub source_dirs: Vec<String>,

    /// Include directories, relative to the project
    #[serde(default)]
    pub include_dirs: Vec<String>,

    /// Third-party dependency names, looked up under `3rdparty/<name>`
    #[serde(default)]
    pub third_party_deps: Vec<String>,

    /// Paths to other projects this one depends on
    #[serde(default)]
    pub internal_deps: Vec<String>,

    #[serde(default)]
    executable: Option<ExecutableSpec>,

    #[serde(default)]
    library: Option<LibrarySpec>,
}

impl ProjectDescriptor {
    /// Create an empty descriptor with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        ProjectDescriptor {
            name: name.into(),
            version: default_version(),
            source_dirs: Vec::new(),
            include_dirs: Vec::new(),
            third_party_deps: Vec::new(),
            internal_deps: Vec::new(),
            executable: None,
            library: None,
        }
    }

    /// Load `Project.json` from a project directory.
    pub fn load(fs: &dyn FileSystem, project_dir: &Path) -> Result<Self, DescriptorError> {
        let path = project_dir.join(PROJECT_FILE);
        let contents = read_descriptor(fs, &path)?;
        Self::parse(&contents, &path)
    }

    /// Parse and validate descriptor JSON. `path` is used for error messages.
    pub fn parse(contents: &str, path: &Path) -> Result<Self, DescriptorError> {
        let mut descriptor: ProjectDescriptor =
            serde_json::from_str(contents).map_err(|source| DescriptorError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        descriptor.expand_env(|key| std::env::var(key).ok());
        descriptor.validate(path)?;
        Ok(descriptor)
    }

    fn validate(&self, path: &Path) -> Result<(), DescriptorError> {
        if self.name.trim().is_empty() {
            return Err(DescriptorError::Invalid {
                path: path.to_path_buf(),
                reason: "`name` must not be empty".to_string(),
            });
        }

        for name in &self.third_party_deps {
            if name.trim().is_empty() || name.contains(['/', '\\']) {
                return Err(DescriptorError::Invalid {
                    path: path.to_path_buf(),
                    reason: format!("invalid third-party dependency name `{}`", name),
                });
            }
        }

        if self.internal_deps.iter().any(|dep| dep.trim().is_empty()) {
            return Err(DescriptorError::Invalid {
                path: path.to_path_buf(),
                reason: "internal dependency paths must not be empty".to_string(),
            });
        }

        if let Some(exe) = self.executable() {
            if exe.entry_file.as_deref().map_or(true, str::is_empty) {
                return Err(DescriptorError::Invalid {
                    path: path.to_path_buf(),
                    reason: format!(
                        "executable enabled for `{}` but no entry_file specified",
                        self.name
                    ),
                });
            }
        }

        Ok(())
    }

    /// Expand `${VAR}` and `%VAR%` references in dependency entries and
    /// include directories. Unknown variables expand to an empty string.
    pub fn expand_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let expand_all = |items: &mut Vec<String>| {
            for item in items.iter_mut() {
                *item = expand_env_vars(item, &lookup);
            }
        };
        expand_all(&mut self.third_party_deps);
        expand_all(&mut self.internal_deps);
        expand_all(&mut self.include_dirs);
    }

    /// Executable settings, if an executable is built.
    pub fn executable(&self) -> Option<&ExecutableSpec> {
        self.executable.as_ref().filter(|e| e.compile)
    }

    /// Library settings, if a library is built.
    pub fn library(&self) -> Option<&LibrarySpec> {
        self.library.as_ref().filter(|l| l.compile)
    }

    /// Set the executable settings.
    pub fn with_executable(mut self, entry_file: impl Into<String>) -> Self {
        self.executable = Some(ExecutableSpec {
            compile: true,
            entry_file: Some(entry_file.into()),
        });
        self
    }

    /// Set the library settings.
    pub fn with_library(mut self, library: LibrarySpec) -> Self {
        self.library = Some(library);
        self
    }

    /// Whether this project produces an installable, exported package.
    pub fn is_exportable(&self) -> bool {
        self.library().and_then(LibrarySpec::install_dir).is_some()
    }

    /// Name of the target other projects link against.
    ///
    /// Libraries are named `<name>Lib`; a project with only an executable
    /// links as `<name>`; a project building nothing has no target.
    pub fn primary_target(&self) -> Option<String> {
        if self.library().is_some() {
            Some(format!("{}Lib", self.name))
        } else if self.executable().is_some() {
            Some(self.name.clone())
        } else {
            None
        }
    }
}

impl LibrarySpec {
    /// A static library without install rules.
    pub fn static_lib() -> Self {
        LibrarySpec {
            compile: true,
            is_static: true,
            install_dir: None,
            export_headers: Vec::new(),
        }
    }

    /// Set the install directory.
    pub fn installed_to(mut self, dir: impl Into<String>) -> Self {
        self.install_dir = Some(dir.into());
        self
    }
}

/// A parsed `Solution.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolutionDescriptor {
    /// Solution name
    pub name: String,

    /// Project directories, relative to the solution file
    #[serde(default)]
    pub projects: Vec<String>,
}

impl SolutionDescriptor {
    /// Load a solution descriptor from a file.
    pub fn load(fs: &dyn FileSystem, path: &Path) -> Result<Self, DescriptorError> {
        let contents = read_descriptor(fs, path)?;
        let solution: SolutionDescriptor =
            serde_json::from_str(&contents).map_err(|source| DescriptorError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        if solution.name.trim().is_empty() {
            return Err(DescriptorError::Invalid {
                path: path.to_path_buf(),
                reason: "`name` must not be empty".to_string(),
            });
        }

        Ok(solution)
    }
}

fn read_descriptor(fs: &dyn FileSystem, path: &Path) -> Result<String, DescriptorError> {
    if !fs.is_file(path) {
        return Err(DescriptorError::NotFound {
            path: path.to_path_buf(),
        });
    }

    fs.read_to_string(path).map_err(|source| DescriptorError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Expand `${VAR}` and `%VAR%` references using `lookup`.
pub fn expand_env_vars(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut value = input.to_string();
    for re in [BRACE_VAR.as_ref(), PERCENT_VAR.as_ref()].into_iter().flatten() {
        value = re
            .replace_all(&value, |caps: &regex::Captures<'_>| {
                lookup(&caps[1]).unwrap_or_default()
            })
            .into_owned();
    }
    value
}
