//! CMake script emitter.
//!
//! Renders an [`EmissionPlan`] into `CMakeLists.txt` files. Rendering is
//! pure: nothing is written here, so a failed run never leaves a
//! half-written script behind.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::Result;
use glob::Pattern;

use crate::builder::plan::{EmissionPlan, PlanEntry, PlannedEdge, Visibility};
use crate::core::{ProjectDescriptor, SolutionDescriptor};
use crate::resolver::ResolutionMode;
use crate::util::config::GenerateConfig;
use crate::util::fs::{clean_path, cmake_path, relative_path};
use crate::util::FileSystem;

/// Name of the generated build script.
pub const CMAKE_LISTS: &str = "CMakeLists.txt";

/// A rendered file, not yet written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub path: PathBuf,
    pub contents: String,
}

/// Renders plan entries into CMake scripts.
pub struct CMakeEmitter<'a> {
    fs: &'a dyn FileSystem,
    config: &'a GenerateConfig,
    source_patterns: Vec<Pattern>,
}

impl<'a> CMakeEmitter<'a> {
    /// Create an emitter. Fails if a configured source pattern is invalid.
    pub fn new(fs: &'a dyn FileSystem, config: &'a GenerateConfig) -> Result<Self> {
        Ok(CMakeEmitter {
            fs,
            config,
            source_patterns: config.compiled_source_patterns()?,
        })
    }

    /// Render a script for every project-like entry of the plan, in plan
    /// order.
    pub fn render_plan(&self, plan: &EmissionPlan) -> Vec<GeneratedFile> {
        plan.project_entries()
            .flat_map(|entry| self.render_project(plan, entry))
            .collect()
    }

    /// Render `CMakeLists.txt` (and `<name>Config.cmake` for exportable
    /// libraries) for one project-like entry.
    pub fn render_project(&self, plan: &EmissionPlan, entry: &PlanEntry) -> Vec<GeneratedFile> {
        let Some(descriptor) = entry.descriptor.as_deref() else {
            return Vec::new();
        };
        let dir = entry.identity.as_path();
        let name = &descriptor.name;

        let mut out = Lines::default();
        out.push(format!(
            "cmake_minimum_required(VERSION {})",
            self.config.cmake_minimum_version
        ));
        out.push(format!("project({} VERSION {})", name, descriptor.version));
        out.blank();
        out.push(format!("add_definitions(-DRootPath=\"{}\")", cmake_path(dir)));
        out.blank();
        self.push_cxx_standard(&mut out);

        let install_dir = descriptor
            .library()
            .and_then(|lib| lib.install_dir())
            .map(|d| clean_path(&dir.join(d)));
        if let Some(install_dir) = &install_dir {
            out.push(format!(
                "set(CMAKE_INSTALL_PREFIX \"{}\" CACHE PATH \"Install prefix\" FORCE)",
                cmake_path(install_dir)
            ));
            out.blank();
        }

        let mut links = Vec::new();
        for edge in &entry.edges {
            let Some(dep) = plan.get(edge.dependency) else {
                continue;
            };
            if push_import(&mut out, dep) {
                if let Some(item) = link_item(edge, dep) {
                    links.push(item);
                }
            }
        }
        if !entry.edges.is_empty() {
            out.blank();
        }

        let sources = self.collect_sources(dir, &descriptor.source_dirs);
        let include_dirs: Vec<String> = descriptor
            .include_dirs
            .iter()
            .map(|d| cmake_path(&clean_path(&dir.join(d))))
            .collect();

        let mut files = Vec::new();

        if let Some(lib) = descriptor.library() {
            let lib_target = format!("{}Lib", name);
            let kind = if lib.is_static { "STATIC" } else { "SHARED" };

            out.push(format!("add_library({} {}", lib_target, kind));
            out.indented(&sources);
            out.push(")");

            if !include_dirs.is_empty() {
                out.push(format!("target_include_directories({} PUBLIC", lib_target));
                for include in &include_dirs {
                    out.push(format!("    $<BUILD_INTERFACE:{}>", include));
                }
                out.push("    $<INSTALL_INTERFACE:include>");
                out.push(")");
            }

            if !links.is_empty() {
                out.push(format!("target_link_libraries({} PRIVATE", lib_target));
                out.indented(&links);
                out.push(")");
            }

            if install_dir.is_some() {
                out.blank();
                out.push(format!("install(TARGETS {} EXPORT {}Targets", lib_target, name));
                out.push("    DESTINATION lib)");

                if !lib.export_headers.is_empty() {
                    out.push("install(FILES");
                    out.indented(&lib.export_headers);
                    out.push("    DESTINATION include)");
                }

                out.push(format!("install(EXPORT {}Targets", name));
                out.push(format!("    FILE {}Targets.cmake", name));
                out.push(format!("    NAMESPACE {}::", name));
                out.push(format!("    DESTINATION lib/cmake/{})", name));
                out.push(format!("install(FILES {}Config.cmake", name));
                out.push(format!("    DESTINATION lib/cmake/{})", name));

                files.push(render_package_config(dir, descriptor));
            }
            out.blank();
        }

        if let Some(exe) = descriptor.executable() {
            let entry_file = exe.entry_file.as_deref().unwrap_or_default().replace('\\', "/");
            let entry_file = cmake_path(&clean_path(Path::new(&entry_file)));

            out.push(format!("add_executable({}", name));
            out.push(format!("    {}", entry_file));
            if descriptor.library().is_none() {
                let rest: Vec<_> = sources.iter().filter(|s| **s != entry_file).cloned().collect();
                out.indented(&rest);
            }
            out.push(")");

            if !include_dirs.is_empty() {
                out.push(format!("target_include_directories({} PRIVATE", name));
                out.indented(&include_dirs);
                out.push(")");
            }

            let mut exe_links = Vec::new();
            if descriptor.library().is_some() {
                exe_links.push(format!("{}Lib", name));
            }
            exe_links.extend(links.iter().cloned());
            if !exe_links.is_empty() {
                out.push(format!("target_link_libraries({} PRIVATE", name));
                out.indented(&exe_links);
                out.push(")");
            }
            out.blank();
        }

        files.insert(
            0,
            GeneratedFile {
                path: dir.join(CMAKE_LISTS),
                contents: out.finish(),
            },
        );
        files
    }

    /// Render the solution-level `CMakeLists.txt`, adding every project-like
    /// entry of the plan in plan order.
    pub fn render_solution(
        &self,
        solution: &SolutionDescriptor,
        solution_dir: &Path,
        plan: &EmissionPlan,
    ) -> GeneratedFile {
        let mut out = Lines::default();
        out.push(format!(
            "cmake_minimum_required(VERSION {})",
            self.config.cmake_minimum_version
        ));
        out.push(format!("project({})", solution.name));
        out.blank();
        self.push_cxx_standard(&mut out);

        for entry in plan.project_entries() {
            let binary_dir = if entry.identity.starts_with(solution_dir) {
                cmake_path(&relative_path(solution_dir, &entry.identity))
            } else {
                format!("deps/{}", entry.name)
            };
            out.push(format!(
                "add_subdirectory(\"{}\" \"${{CMAKE_BINARY_DIR}}/{}\")",
                cmake_path(&entry.identity),
                binary_dir
            ));
        }

        GeneratedFile {
            path: solution_dir.join(CMAKE_LISTS),
            contents: out.finish(),
        }
    }

    fn push_cxx_standard(&self, out: &mut Lines) {
        out.push(format!("set(CMAKE_CXX_STANDARD {})", self.config.cxx_standard));
        out.push("set(CMAKE_CXX_STANDARD_REQUIRED ON)");
        out.blank();
    }

    /// Source files under `source_dirs`, relative to the project, sorted.
    fn collect_sources(&self, project_dir: &Path, source_dirs: &[String]) -> Vec<String> {
        let mut sources = BTreeSet::new();
        for source_dir in source_dirs {
            let abs = clean_path(&project_dir.join(source_dir));
            if !self.fs.is_dir(&abs) {
                tracing::warn!("Source directory {} does not exist", abs.display());
                continue;
            }
            for file in self.fs.find_files(&abs, &self.source_patterns, None) {
                sources.insert(cmake_path(&relative_path(project_dir, &file)));
            }
        }
        sources.into_iter().collect()
    }
}

/// Emit the lines that bring `dep` into scope. Returns false when the
/// dependency has nothing to link against.
fn push_import(out: &mut Lines, dep: &PlanEntry) -> bool {
    let dir = cmake_path(&dep.identity);
    match dep.mode {
        Some(ResolutionMode::Module) => {
            out.push(format!("list(APPEND CMAKE_MODULE_PATH \"{}\")", dir));
            out.push(format!("find_package({} REQUIRED)", dep.name));
            true
        }
        Some(ResolutionMode::Config) => {
            let location = dep.location.as_deref().unwrap_or(&dep.identity);
            out.push(format!(
                "find_package({} REQUIRED PATHS \"{}\")",
                dep.name,
                cmake_path(location)
            ));
            true
        }
        Some(ResolutionMode::Source) => {
            push_subdirectory(out, &dep.name, &dir, &dep.name);
            true
        }
        Some(ResolutionMode::Project) | None => match dep.link_target() {
            Some(target) => {
                let binary_name = dep
                    .identity
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| dep.name.clone());
                push_subdirectory(out, &target, &dir, &binary_name);
                true
            }
            None => {
                tracing::warn!("`{}` builds no target; nothing to link against", dep.name);
                false
            }
        },
    }
}

fn push_subdirectory(out: &mut Lines, target: &str, dir: &str, binary_name: &str) {
    out.push(format!("if(NOT TARGET {})", target));
    out.push(format!(
        "    add_subdirectory(\"{}\" \"${{CMAKE_BINARY_DIR}}/deps/{}\")",
        dir, binary_name
    ));
    out.push("endif()");
}

fn link_item(edge: &PlannedEdge, dep: &PlanEntry) -> Option<String> {
    let target = dep.link_target()?;
    Some(match edge.visibility {
        Visibility::Normal => target,
        Visibility::BuildTimeOnly => format!("$<BUILD_INTERFACE:{}>", target),
    })
}

fn render_package_config(dir: &Path, descriptor: &ProjectDescriptor) -> GeneratedFile {
    let name = &descriptor.name;
    GeneratedFile {
        path: dir.join(format!("{}Config.cmake", name)),
        contents: format!(
            "include(${{CMAKE_CURRENT_LIST_DIR}}/{}Targets.cmake)\nset({}_VERSION {})\n",
            name, name, descriptor.version
        ),
    }
}

/// Line buffer for script text.
#[derive(Debug, Default)]
struct Lines(Vec<String>);

impl Lines {
    fn push(&mut self, line: impl Into<String>) {
        self.0.push(line.into());
    }

    fn indented(&mut self, items: &[String]) {
        self.0.extend(items.iter().map(|item| format!("    {}", item)));
    }

    fn blank(&mut self) {
        if self.0.last().is_some_and(|l| !l.is_empty()) {
            self.0.push(String::new());
        }
    }

    fn finish(mut self) -> String {
        while self.0.last().is_some_and(|l| l.is_empty()) {
            self.0.pop();
        }
        let mut text = self.0.join("\n");
        text.push('\n');
        text
    }
}
