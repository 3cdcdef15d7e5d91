//! Emission plan generation.
//!
//! An EmissionPlan lists every node of a [`BuildGraph`] reachable from the
//! requested roots, dependencies before dependents, each exactly once. Every
//! edge carries the visibility its usage requirements must be given in the
//! generated script.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;

use crate::core::ProjectDescriptor;
use crate::resolver::{BuildGraph, Node, NodeId, NodeKind, ResolutionMode, ResolveError};

/// How a dependency's usage requirements reach the consumer's interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    /// Propagated normally
    Normal,
    /// Only applies while building the consumer; kept out of its export
    BuildTimeOnly,
}

/// An edge of a plan entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedEdge {
    /// Index of the dependency in the plan; always lower than the consumer's
    pub dependency: usize,
    /// Name of the dependency
    pub name: String,
    /// Visibility of the dependency's usage requirements
    pub visibility: Visibility,
}

/// One node of the plan.
#[derive(Debug, Clone, Serialize)]
pub struct PlanEntry {
    /// Project or library name
    pub name: String,
    /// Identity directory
    pub identity: PathBuf,
    pub kind: NodeKind,
    /// Resolution mode (libraries only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<ResolutionMode>,
    /// Package config directory for `Config` mode libraries
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<PathBuf>,
    /// Outgoing edges in declaration order
    pub edges: Vec<PlannedEdge>,
    /// Descriptor of a project or `Project` mode library
    #[serde(skip)]
    pub descriptor: Option<Arc<ProjectDescriptor>>,
    #[serde(skip)]
    pub node: NodeId,
}

impl PlanEntry {
    /// Whether this entry gets its own generated script.
    pub fn is_project_like(&self) -> bool {
        self.descriptor.is_some()
    }

    /// Name of the target a consumer links against.
    pub fn link_target(&self) -> Option<String> {
        match &self.descriptor {
            Some(descriptor) => descriptor.primary_target(),
            None => Some(self.name.clone()),
        }
    }
}

/// A leaves-first emission order over a build graph.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EmissionPlan {
    entries: Vec<PlanEntry>,
    /// Plan indexes of the requested roots, in request order
    roots: Vec<usize>,
}

impl EmissionPlan {
    /// All entries, dependencies first.
    pub fn entries(&self) -> &[PlanEntry] {
        &self.entries
    }

    /// Get an entry by plan index.
    pub fn get(&self, index: usize) -> Option<&PlanEntry> {
        self.entries.get(index)
    }

    /// The root entries, in the order they were requested.
    pub fn roots(&self) -> impl Iterator<Item = &PlanEntry> {
        self.roots.iter().map(move |&i| &self.entries[i])
    }

    /// Position of an entry by name.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.name == name)
    }

    /// Entries that get their own script.
    pub fn project_entries(&self) -> impl Iterator<Item = &PlanEntry> {
        self.entries.iter().filter(|e| e.is_project_like())
    }

    /// Get the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Visibility of the edge `consumer -> dependency`.
///
/// A source-mode dependency is built in place and has no install rules, so
/// it must stay out of an exportable consumer's installed interface.
pub fn edge_visibility(consumer: &Node, dependency: &Node) -> Visibility {
    if dependency.mode() == Some(ResolutionMode::Source) && consumer.is_exportable() {
        Visibility::BuildTimeOnly
    } else {
        Visibility::Normal
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    InProgress,
    Done(usize),
}

/// Plan emission for `roots`.
///
/// Depth-first post-order from each root in turn, following edges in
/// declaration order. A node reached from several roots is emitted once, at
/// its first discovery.
pub fn plan(graph: &BuildGraph, roots: &[NodeId]) -> Result<EmissionPlan, ResolveError> {
    let mut plan = EmissionPlan::default();
    let mut marks: HashMap<NodeId, Mark> = HashMap::new();

    for &root in roots {
        if let Some(Mark::Done(index)) = marks.get(&root) {
            plan.roots.push(*index);
            continue;
        }

        // (node, its ordered dependencies, next dependency to visit)
        let mut stack: Vec<(NodeId, Vec<NodeId>, usize)> = vec![(root, graph.edges_of(root), 0)];
        marks.insert(root, Mark::InProgress);

        while let Some((node, deps, next)) = stack.last_mut() {
            if let Some(&dep) = deps.get(*next) {
                *next += 1;
                match marks.get(&dep) {
                    Some(Mark::Done(_)) => {}
                    Some(Mark::InProgress) => {
                        return Err(cycle_error(graph, &stack, dep));
                    }
                    None => {
                        marks.insert(dep, Mark::InProgress);
                        stack.push((dep, graph.edges_of(dep), 0));
                    }
                }
                continue;
            }

            let node = *node;
            stack.pop();
            let index = emit(graph, &mut plan, &marks, node);
            marks.insert(node, Mark::Done(index));
        }

        if let Some(Mark::Done(index)) = marks.get(&root) {
            plan.roots.push(*index);
        }
    }

    let mut seen = HashSet::new();
    plan.roots.retain(|index| seen.insert(*index));

    tracing::debug!("Planned {} node(s) for {} root(s)", plan.len(), plan.roots.len());
    Ok(plan)
}

fn emit(graph: &BuildGraph, plan: &mut EmissionPlan, marks: &HashMap<NodeId, Mark>, id: NodeId) -> usize {
    let node = graph.node(id);

    let edges = graph
        .edges_of(id)
        .into_iter()
        .filter_map(|dep| match marks.get(&dep) {
            Some(Mark::Done(index)) => {
                let dependency = graph.node(dep);
                Some(PlannedEdge {
                    dependency: *index,
                    name: dependency.name().to_string(),
                    visibility: edge_visibility(node, dependency),
                })
            }
            _ => None,
        })
        .collect();

    let location = match node {
        Node::Library(l) if l.mode == ResolutionMode::Config => Some(l.location.clone()),
        _ => None,
    };

    plan.entries.push(PlanEntry {
        name: node.name().to_string(),
        identity: node.identity().to_path_buf(),
        kind: node.kind(),
        mode: node.mode(),
        location,
        edges,
        descriptor: node.descriptor().cloned(),
        node: id,
    });
    plan.entries.len() - 1
}

fn cycle_error(graph: &BuildGraph, stack: &[(NodeId, Vec<NodeId>, usize)], dep: NodeId) -> ResolveError {
    let start = stack.iter().position(|(id, _, _)| *id == dep).unwrap_or(0);
    let mut cycle: Vec<String> = stack[start..]
        .iter()
        .map(|(id, _, _)| graph.node(*id).name().to_string())
        .collect();
    cycle.push(graph.node(dep).name().to_string());
    ResolveError::CyclicDependency { cycle }
}
