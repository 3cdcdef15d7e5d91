//! Dependency resolver.
//!
//! Walks a project's declared dependencies depth-first with an explicit work
//! stack. The stack doubles as the cycle guard: every frame is a project
//! that is still being resolved, so meeting one of their directories again
//! means the graph has a cycle.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::core::ProjectDescriptor;
use crate::resolver::errors::ResolveError;
use crate::resolver::graph::{BuildGraph, NodeId};
use crate::resolver::probe::{LibraryProbe, ResolutionMode};
use crate::util::config::{ProbeConfig, DEFAULT_THIRD_PARTY_DIR};
use crate::util::fs::clean_path;
use crate::util::FileSystem;

/// Where third-party libraries are searched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRoots {
    /// Solution root; its third-party directory is the shared fallback
    pub solution_root: PathBuf,
    /// Name of the third-party directory (`3rdparty`)
    pub third_party_dir: String,
}

impl SearchRoots {
    /// Search roots with the default third-party directory name.
    pub fn new(solution_root: impl Into<PathBuf>) -> Self {
        SearchRoots {
            solution_root: clean_path(&solution_root.into()),
            third_party_dir: DEFAULT_THIRD_PARTY_DIR.to_string(),
        }
    }

    /// Use a different third-party directory name.
    pub fn with_third_party_dir(mut self, dir: impl Into<String>) -> Self {
        self.third_party_dir = dir.into();
        self
    }

    /// Candidate directories for `name` as seen from `project_dir`:
    /// project-local first, then the solution root.
    pub fn candidates(&self, project_dir: &Path, name: &str) -> Vec<PathBuf> {
        let local = project_dir.join(&self.third_party_dir).join(name);
        let shared = self.solution_root.join(&self.third_party_dir).join(name);

        if local == shared {
            vec![local]
        } else {
            vec![local, shared]
        }
    }
}

/// A dependency as declared in a descriptor.
#[derive(Debug, Clone)]
enum Declared {
    ThirdParty(String),
    Internal(String),
}

/// A project being resolved.
#[derive(Debug)]
struct Frame {
    node: NodeId,
    dir: PathBuf,
    name: String,
    pending: Vec<Declared>,
    next: usize,
}

impl Frame {
    fn new(node: NodeId, dir: PathBuf, descriptor: &ProjectDescriptor) -> Self {
        let pending = descriptor
            .third_party_deps
            .iter()
            .cloned()
            .map(Declared::ThirdParty)
            .chain(descriptor.internal_deps.iter().cloned().map(Declared::Internal))
            .collect();

        Frame {
            node,
            dir,
            name: descriptor.name.clone(),
            pending,
            next: 0,
        }
    }

    fn next_dependency(&mut self) -> Option<Declared> {
        let dep = self.pending.get(self.next).cloned();
        self.next += 1;
        dep
    }
}

/// Resolves projects into a shared [`BuildGraph`].
///
/// One resolver lives for one run. Calling [`Resolver::resolve`] for several
/// projects accumulates them into the same graph, so a project reached
/// from two places is resolved once.
pub struct Resolver<'a> {
    fs: &'a dyn FileSystem,
    roots: SearchRoots,
    probe: LibraryProbe<'a>,
    graph: BuildGraph,
    descriptors: HashMap<PathBuf, Arc<ProjectDescriptor>>,
}

impl<'a> Resolver<'a> {
    /// Create a resolver over a filesystem and search roots.
    pub fn new(fs: &'a dyn FileSystem, roots: SearchRoots) -> Self {
        Resolver {
            fs,
            roots,
            probe: LibraryProbe::new(fs),
            graph: BuildGraph::new(),
            descriptors: HashMap::new(),
        }
    }

    /// Create a resolver configured from the `[probe]` config section.
    pub fn with_config(fs: &'a dyn FileSystem, solution_root: &Path, config: &ProbeConfig) -> Self {
        let roots =
            SearchRoots::new(solution_root).with_third_party_dir(config.third_party_dir.clone());
        let mut resolver = Self::new(fs, roots);
        resolver.probe = LibraryProbe::new(fs).with_config_depth(config.config_search_depth);
        resolver
    }

    /// The graph built so far.
    pub fn graph(&self) -> &BuildGraph {
        &self.graph
    }

    /// Finish the run and take the graph.
    pub fn into_graph(self) -> BuildGraph {
        self.graph
    }

    /// Resolve the project in `project_dir` and everything it depends on.
    ///
    /// Returns the cached node if the directory was already resolved in this
    /// run.
    pub fn resolve(&mut self, project_dir: &Path) -> Result<NodeId, ResolveError> {
        let dir = clean_path(project_dir);
        if let Some(id) = self.graph.node_at(&dir) {
            return Ok(id);
        }

        let descriptor = self.load(&dir)?;
        tracing::debug!("Resolving project `{}` at {}", descriptor.name, dir.display());
        let root = self.graph.insert_project(dir.clone(), descriptor.clone())?;

        let mut stack = vec![Frame::new(root, dir, &descriptor)];

        loop {
            let Some(frame) = stack.last_mut() else {
                break;
            };
            let Some(dep) = frame.next_dependency() else {
                stack.pop();
                continue;
            };
            let consumer = frame.node;
            let consumer_dir = frame.dir.clone();
            let consumer_name = frame.name.clone();

            match dep {
                Declared::ThirdParty(name) => {
                    let candidates = self.roots.candidates(&consumer_dir, &name);
                    let library = self.probe.probe(&name, &candidates, &consumer_name)?;

                    if library.mode != ResolutionMode::Project {
                        let id = self.graph.insert_library(library)?;
                        self.graph.add_edge(consumer, id);
                        continue;
                    }

                    let lib_dir = library.dir.clone();
                    guard_cycle(&stack, &lib_dir, || self.project_name(&lib_dir))?;
                    let resolved = self.graph.node_at(&lib_dir).is_some();

                    // Inserted even when resolved, so the name is claimed.
                    let descriptor = self.load(&lib_dir)?;
                    let id = self
                        .graph
                        .insert_library(library.with_project(descriptor.clone()))?;
                    self.graph.add_edge(consumer, id);
                    if !resolved {
                        stack.push(Frame::new(id, lib_dir, &descriptor));
                    }
                }

                Declared::Internal(path) => {
                    let dep_dir = self.locate_internal(&consumer_dir, &path);
                    guard_cycle(&stack, &dep_dir, || self.project_name(&dep_dir))?;
                    if let Some(id) = self.graph.node_at(&dep_dir) {
                        self.graph.add_edge(consumer, id);
                        continue;
                    }

                    let descriptor = self.load(&dep_dir)?;
                    tracing::debug!(
                        "Resolving project `{}` (required by `{}`)",
                        descriptor.name,
                        consumer_name
                    );
                    let id = self.graph.insert_project(dep_dir.clone(), descriptor.clone())?;
                    self.graph.add_edge(consumer, id);
                    stack.push(Frame::new(id, dep_dir, &descriptor));
                }
            }
        }

        Ok(root)
    }

    /// Locate an internal dependency: absolute paths as-is, relative paths
    /// against the declaring project, then against the solution root.
    fn locate_internal(&self, consumer_dir: &Path, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() {
            return clean_path(path);
        }

        let local = clean_path(&consumer_dir.join(path));
        if self.fs.is_dir(&local) {
            return local;
        }

        let shared = clean_path(&self.roots.solution_root.join(path));
        if self.fs.is_dir(&shared) {
            shared
        } else {
            local
        }
    }

    /// Load a descriptor once per directory for the lifetime of the run.
    fn load(&mut self, dir: &Path) -> Result<Arc<ProjectDescriptor>, ResolveError> {
        if let Some(descriptor) = self.descriptors.get(dir) {
            return Ok(descriptor.clone());
        }

        let descriptor = Arc::new(ProjectDescriptor::load(self.fs, dir)?);
        self.descriptors.insert(dir.to_path_buf(), descriptor.clone());
        Ok(descriptor)
    }

    fn project_name(&self, dir: &Path) -> String {
        self.descriptors
            .get(dir)
            .map(|d| d.name.clone())
            .unwrap_or_else(|| dir.display().to_string())
    }
}

/// Fail if `dir` is still being resolved further up the stack.
fn guard_cycle(
    stack: &[Frame],
    dir: &Path,
    name_of: impl FnOnce() -> String,
) -> Result<(), ResolveError> {
    let Some(start) = stack.iter().position(|frame| frame.dir == dir) else {
        return Ok(());
    };

    let mut cycle: Vec<String> = stack[start..].iter().map(|f| f.name.clone()).collect();
    cycle.push(name_of());
    Err(ResolveError::CyclicDependency { cycle })
}
