//! Implementation of `cmakegen generate`.

use anyhow::{Context, Result};

use crate::builder::cmake::{CMakeEmitter, GeneratedFile};
use crate::builder::plan::EmissionPlan;
use crate::core::Workspace;
use crate::ops::resolve::resolve_workspace;
use crate::util::config::Config;
use crate::util::fs::write_atomic;
use crate::util::FileSystem;

/// Options for the generate command.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Render everything but write nothing
    pub dry_run: bool,
}

/// Outcome of a generation run.
#[derive(Debug)]
pub struct GenerateResult {
    /// The plan the scripts were rendered from
    pub plan: EmissionPlan,

    /// Rendered files, dependencies first, solution aggregate last
    pub files: Vec<GeneratedFile>,
}

/// Resolve, plan and render every script of the workspace, then write them.
///
/// Nothing is written unless resolution, planning and rendering all
/// succeeded.
pub fn generate(
    fs: &dyn FileSystem,
    ws: &Workspace,
    config: &Config,
    opts: &GenerateOptions,
) -> Result<GenerateResult> {
    let resolved = resolve_workspace(fs, ws, config)?;
    let plan = resolved.plan()?;

    let emitter = CMakeEmitter::new(fs, &config.generate)?;
    let mut files = emitter.render_plan(&plan);
    if let Some(solution) = &resolved.solution {
        files.push(emitter.render_solution(solution, ws.input().dir(), &plan));
    }

    if opts.dry_run {
        for file in &files {
            tracing::info!("Would generate {}", file.path.display());
        }
    } else {
        for file in &files {
            write_atomic(&file.path, &file.contents)
                .with_context(|| format!("failed to write {}", file.path.display()))?;
            tracing::info!("Generated {}", file.path.display());
        }
    }

    Ok(GenerateResult { plan, files })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Input;
    use crate::resolver::ResolveError;
    use crate::util::RealFs;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn write(path: &Path, contents: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn solution_workspace(root: &Path) -> Workspace {
        Workspace::new(
            Input::Solution {
                path: root.join("Solution.json"),
            },
            root.to_path_buf(),
        )
    }

    fn demo_solution(root: &Path) {
        write(&root.join("Solution.json"), r#"{ "name": "Demo", "projects": ["AppB", "LibA"] }"#);
        write(
            &root.join("AppB/Project.json"),
            r#"{ "name": "AppB", "executable": { "entry_file": "main.cpp" }, "internal_deps": ["../LibA"] }"#,
        );
        write(&root.join("AppB/main.cpp"), "int main() { return 0; }\n");
        write(
            &root.join("LibA/Project.json"),
            r#"{ "name": "LibA", "source_dirs": ["src"], "third_party_deps": ["fmt"],
                 "library": { "install_dir": "install" } }"#,
        );
        write(&root.join("LibA/src/a.cpp"), "");
        write(&root.join("3rdparty/fmt/CMakeLists.txt"), "");
    }

    #[test]
    fn test_generate_writes_every_script() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        demo_solution(root);

        let result = generate(&RealFs, &solution_workspace(root), &Config::default(), &GenerateOptions::default())
            .unwrap();

        assert_eq!(result.files.len(), 4);
        assert!(root.join("CMakeLists.txt").is_file());
        assert!(root.join("AppB/CMakeLists.txt").is_file());
        assert!(root.join("LibA/LibAConfig.cmake").is_file());

        let lib = fs::read_to_string(root.join("LibA/CMakeLists.txt")).unwrap();
        assert!(lib.contains("$<BUILD_INTERFACE:fmt>"));
        assert!(lib.contains("    src/a.cpp"));
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        demo_solution(root);

        let opts = GenerateOptions { dry_run: true };
        let result = generate(&RealFs, &solution_workspace(root), &Config::default(), &opts).unwrap();

        assert!(!result.files.is_empty());
        assert!(!root.join("CMakeLists.txt").exists());
        assert!(!root.join("LibA/CMakeLists.txt").exists());
    }

    #[test]
    fn test_cycle_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        write(&root.join("Solution.json"), r#"{ "name": "Loop", "projects": ["A"] }"#);
        write(&root.join("A/Project.json"), r#"{ "name": "A", "library": {}, "internal_deps": ["../B"] }"#);
        write(&root.join("B/Project.json"), r#"{ "name": "B", "library": {}, "internal_deps": ["../A"] }"#);

        let err = generate(&RealFs, &solution_workspace(root), &Config::default(), &GenerateOptions::default())
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ResolveError>(),
            Some(ResolveError::CyclicDependency { .. })
        ));
        assert!(!root.join("A/CMakeLists.txt").exists());
        assert!(!root.join("CMakeLists.txt").exists());
    }
}
