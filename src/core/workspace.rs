//! Workspace - what the user asked to generate, and where.
//!
//! A Workspace pins down the input descriptor (a solution or a single
//! project) and the solution root whose `3rdparty` directory is searched for
//! libraries.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::core::descriptor::{PROJECT_FILE, SOLUTION_FILE};
use crate::util::diagnostic::suggestions;
use crate::util::fs::normalize_path;

/// The descriptor a generation request starts from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// A `Solution.json` file listing several projects
    Solution { path: PathBuf },
    /// A single project directory containing `Project.json`
    Project { dir: PathBuf },
}

impl Input {
    /// Directory holding the input descriptor.
    pub fn dir(&self) -> &Path {
        match self {
            Input::Solution { path } => path.parent().unwrap_or(Path::new(".")),
            Input::Project { dir } => dir,
        }
    }
}

/// A resolved generation request.
#[derive(Debug, Clone)]
pub struct Workspace {
    input: Input,
    root: PathBuf,
}

impl Workspace {
    /// Locate the input descriptor and solution root.
    ///
    /// Without an explicit input, `Solution.json` and then `Project.json` are
    /// looked up in `cwd`. A directory input is searched the same way. A file
    /// input is a solution when its JSON object has a `projects` key.
    pub fn discover(cwd: &Path, input: Option<&Path>) -> Result<Self> {
        let input = match input {
            None => find_descriptor(cwd).with_context(|| {
                format!(
                    "no {} or {} found in {}\nhelp: {}",
                    SOLUTION_FILE,
                    PROJECT_FILE,
                    cwd.display(),
                    suggestions::NO_DESCRIPTOR
                )
            })?,
            Some(path) => {
                let path = cwd.join(path);
                if !path.exists() {
                    bail!("input {} not found", path.display());
                }
                let path = normalize_path(&path);

                if path.is_dir() {
                    find_descriptor(&path).with_context(|| {
                        format!(
                            "no {} or {} found in {}",
                            SOLUTION_FILE,
                            PROJECT_FILE,
                            path.display()
                        )
                    })?
                } else {
                    classify_file(&path)?
                }
            }
        };

        let root = find_solution_root(input.dir());
        tracing::debug!("Solution root: {}", root.display());

        Ok(Workspace { input, root })
    }

    /// Create a workspace from known parts.
    pub fn new(input: Input, root: PathBuf) -> Self {
        Workspace { input, root }
    }

    /// The input descriptor.
    pub fn input(&self) -> &Input {
        &self.input
    }

    /// The solution root, whose `3rdparty` directory is the shared search root.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

fn find_descriptor(dir: &Path) -> Option<Input> {
    let dir = normalize_path(dir);
    let solution = dir.join(SOLUTION_FILE);
    if solution.is_file() {
        return Some(Input::Solution { path: solution });
    }
    if dir.join(PROJECT_FILE).is_file() {
        return Some(Input::Project { dir });
    }
    None
}

fn classify_file(path: &Path) -> Result<Input> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read file: {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse {}", path.display()))?;

    if value.get("projects").is_some() {
        return Ok(Input::Solution {
            path: path.to_path_buf(),
        });
    }

    let dir = path.parent().unwrap_or(Path::new(".")).to_path_buf();
    if path.file_name().and_then(|n| n.to_str()) != Some(PROJECT_FILE) {
        bail!(
            "project descriptors must be named {} (got {})",
            PROJECT_FILE,
            path.display()
        );
    }
    Ok(Input::Project { dir })
}

/// Walk up from `start` to the nearest directory containing `3rdparty`.
/// Falls back to `start` itself.
pub fn find_solution_root(start: &Path) -> PathBuf {
    start
        .ancestors()
        .find(|dir| dir.join("3rdparty").is_dir())
        .unwrap_or(start)
        .to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_discover_prefers_solution() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("Solution.json"), r#"{"name":"S","projects":[]}"#).unwrap();
        fs::write(tmp.path().join("Project.json"), r#"{"name":"P"}"#).unwrap();

        let ws = Workspace::discover(tmp.path(), None).unwrap();
        assert!(matches!(ws.input(), Input::Solution { .. }));
    }

    #[test]
    fn test_discover_project_directory() {
        let tmp = TempDir::new().unwrap();
        let project = tmp.path().join("LibA");
        fs::create_dir_all(&project).unwrap();
        fs::write(project.join("Project.json"), r#"{"name":"LibA"}"#).unwrap();

        let ws = Workspace::discover(tmp.path(), Some(Path::new("LibA"))).unwrap();
        assert_eq!(
            ws.input(),
            &Input::Project {
                dir: normalize_path(&project)
            }
        );
    }

    #[test]
    fn test_discover_file_with_projects_key_is_solution() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("all.json"), r#"{"name":"S","projects":["A"]}"#).unwrap();

        let ws = Workspace::discover(tmp.path(), Some(Path::new("all.json"))).unwrap();
        assert!(matches!(ws.input(), Input::Solution { .. }));
    }

    #[test]
    fn test_discover_missing_input() {
        let tmp = TempDir::new().unwrap();
        let err = Workspace::discover(tmp.path(), None).unwrap_err();
        assert!(format!("{:#}", err).contains("no Solution.json or Project.json"));

        let err = Workspace::discover(tmp.path(), Some(Path::new("nope"))).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_solution_root_walks_up_to_3rdparty() {
        let tmp = TempDir::new().unwrap();
        let root = normalize_path(tmp.path());
        let project = root.join("apps/AppB");
        fs::create_dir_all(&project).unwrap();
        fs::create_dir_all(root.join("3rdparty")).unwrap();
        fs::write(project.join("Project.json"), r#"{"name":"AppB"}"#).unwrap();

        let ws = Workspace::discover(&root, Some(Path::new("apps/AppB"))).unwrap();
        assert_eq!(ws.root(), root.as_path());
    }

    #[test]
    fn test_solution_root_defaults_to_input_dir() {
        let tmp = TempDir::new().unwrap();
        let dir = normalize_path(tmp.path());
        assert_eq!(find_solution_root(&dir), dir);
    }
}
