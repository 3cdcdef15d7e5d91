//! Descriptor fixtures for tests.

use std::path::Path;

use serde_json::{json, Value};

use super::MockFileSystem;

/// Builder for a `Project.json` written into a [`MockFileSystem`].
#[derive(Debug, Clone)]
pub struct ProjectFixture {
    name: String,
    source_dirs: Vec<String>,
    include_dirs: Vec<String>,
    third_party: Vec<String>,
    internal: Vec<String>,
    executable: Option<String>,
    library: Option<Option<String>>,
}

impl ProjectFixture {
    pub fn new(name: &str) -> Self {
        ProjectFixture {
            name: name.to_string(),
            source_dirs: Vec::new(),
            include_dirs: Vec::new(),
            third_party: Vec::new(),
            internal: Vec::new(),
            executable: None,
            library: None,
        }
    }

    pub fn sources(mut self, dirs: &[&str]) -> Self {
        self.source_dirs = dirs.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn includes(mut self, dirs: &[&str]) -> Self {
        self.include_dirs = dirs.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn third_party(mut self, names: &[&str]) -> Self {
        self.third_party = names.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn internal(mut self, paths: &[&str]) -> Self {
        self.internal = paths.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn executable(mut self, entry_file: &str) -> Self {
        self.executable = Some(entry_file.to_string());
        self
    }

    /// Build a static library, exportable when `install_dir` is set.
    pub fn library(mut self, install_dir: Option<&str>) -> Self {
        self.library = Some(install_dir.map(str::to_string));
        self
    }

    pub fn to_json(&self) -> Value {
        let mut value = json!({
            "name": self.name,
            "version": "1.0.0",
            "source_dirs": self.source_dirs,
            "include_dirs": self.include_dirs,
            "third_party_deps": self.third_party,
            "internal_deps": self.internal,
        });

        if let Some(entry) = &self.executable {
            value["executable"] = json!({ "compile": true, "entry_file": entry });
        }
        if let Some(install_dir) = &self.library {
            value["library"] = match install_dir {
                Some(dir) => json!({ "compile": true, "static": true, "install_dir": dir }),
                None => json!({ "compile": true, "static": true }),
            };
        }

        value
    }

    /// Write `<dir>/Project.json`.
    pub fn write(&self, fs: &mut MockFileSystem, dir: impl AsRef<Path>) {
        fs.add_file(dir.as_ref().join("Project.json"), self.to_json().to_string());
    }
}

/// Write a `Solution.json` at `path`.
pub fn write_solution(fs: &mut MockFileSystem, path: impl AsRef<Path>, name: &str, projects: &[&str]) {
    fs.add_file(
        path,
        json!({ "name": name, "projects": projects }).to_string(),
    );
}

/// Mark `<dir>` as a source-mode library (`CMakeLists.txt` only).
pub fn source_library(fs: &mut MockFileSystem, dir: impl AsRef<Path>) {
    fs.add_file(dir.as_ref().join("CMakeLists.txt"), "cmake_minimum_required(VERSION 3.10)");
}
