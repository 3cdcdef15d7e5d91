//! Workspace resolution operations.

use std::path::PathBuf;

use anyhow::Result;

use crate::builder::plan::{plan, EmissionPlan};
use crate::core::{Input, SolutionDescriptor, Workspace};
use crate::resolver::{BuildGraph, NodeId, ResolveError, Resolver};
use crate::util::config::Config;
use crate::util::fs::clean_path;
use crate::util::FileSystem;

/// The resolved dependency graph of a workspace.
#[derive(Debug)]
pub struct ResolvedWorkspace {
    /// The graph shared by every project of the workspace
    pub graph: BuildGraph,

    /// Root projects, in the order the input lists them
    pub roots: Vec<NodeId>,

    /// The solution descriptor, for solution inputs
    pub solution: Option<SolutionDescriptor>,
}

impl ResolvedWorkspace {
    /// Plan emission for every root.
    pub fn plan(&self) -> Result<EmissionPlan, ResolveError> {
        plan(&self.graph, &self.roots)
    }
}

/// Project directories named by the workspace input.
pub fn project_dirs(
    fs: &dyn FileSystem,
    ws: &Workspace,
) -> Result<(Vec<PathBuf>, Option<SolutionDescriptor>), ResolveError> {
    match ws.input() {
        Input::Project { dir } => Ok((vec![clean_path(dir)], None)),
        Input::Solution { path } => {
            let solution = SolutionDescriptor::load(fs, path)?;
            let base = ws.input().dir();
            let dirs = solution
                .projects
                .iter()
                .map(|p| clean_path(&base.join(p)))
                .collect();
            Ok((dirs, Some(solution)))
        }
    }
}

/// Resolve every project of the workspace into one graph.
///
/// Resolution stops at the first error; the graph built so far is discarded.
pub fn resolve_workspace(
    fs: &dyn FileSystem,
    ws: &Workspace,
    config: &Config,
) -> Result<ResolvedWorkspace, ResolveError> {
    let (dirs, solution) = project_dirs(fs, ws)?;
    let mut resolver = Resolver::with_config(fs, ws.root(), &config.probe);

    let mut roots = Vec::with_capacity(dirs.len());
    for dir in &dirs {
        tracing::debug!("Resolving project {}", dir.display());
        roots.push(resolver.resolve(dir)?);
    }

    let graph = resolver.into_graph();
    tracing::debug!("Resolved {} node(s)", graph.len());

    Ok(ResolvedWorkspace {
        graph,
        roots,
        solution,
    })
}
