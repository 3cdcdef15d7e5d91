//! BuildGraph - the resolved dependency graph of one run.
//!
//! Nodes are keyed by directory: a project path or the directory a library
//! was found in. Inserting the same identity twice returns the existing node
//! when the content agrees and fails with
//! [`ResolveError::DuplicateIdentityConflict`] when it does not.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};

use crate::core::ProjectDescriptor;
use crate::resolver::errors::ResolveError;
use crate::resolver::probe::{LibraryNode, ResolutionMode};

/// Handle to a node in a [`BuildGraph`].
pub type NodeId = NodeIndex;

/// Whether a node is a project or a third-party library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Project,
    Library,
}

/// An internal project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectNode {
    /// Project directory (its identity)
    pub dir: PathBuf,
    /// The project's descriptor
    pub descriptor: Arc<ProjectDescriptor>,
}

/// A node of the build graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Project(ProjectNode),
    Library(LibraryNode),
}

impl Node {
    /// The directory identifying this node.
    pub fn identity(&self) -> &Path {
        match self {
            Node::Project(p) => &p.dir,
            Node::Library(l) => &l.dir,
        }
    }

    /// Display name: the project name or the declared library name.
    pub fn name(&self) -> &str {
        match self {
            Node::Project(p) => &p.descriptor.name,
            Node::Library(l) => &l.name,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Project(_) => NodeKind::Project,
            Node::Library(_) => NodeKind::Library,
        }
    }

    /// Resolution mode, for libraries.
    pub fn mode(&self) -> Option<ResolutionMode> {
        match self {
            Node::Project(_) => None,
            Node::Library(l) => Some(l.mode),
        }
    }

    /// The descriptor of a project or of a `Project` mode library.
    pub fn descriptor(&self) -> Option<&Arc<ProjectDescriptor>> {
        match self {
            Node::Project(p) => Some(&p.descriptor),
            Node::Library(l) => l.project.as_ref(),
        }
    }

    /// Whether the node builds a library with an install directory.
    pub fn is_exportable(&self) -> bool {
        self.descriptor().is_some_and(|d| d.is_exportable())
    }
}

/// The dependency graph for a run.
#[derive(Debug, Clone, Default)]
pub struct BuildGraph {
    /// Edges point from consumer to dependency.
    graph: DiGraph<Node, ()>,

    /// Map from identity directory to node index
    by_dir: HashMap<PathBuf, NodeId>,

    /// Map from project name to the directory that declared it
    project_names: HashMap<String, PathBuf>,

    /// Map from library name to the directory it resolved to
    library_names: HashMap<String, PathBuf>,
}

impl BuildGraph {
    /// Create a new empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a project, or return the existing node for its directory.
    pub fn insert_project(
        &mut self,
        dir: PathBuf,
        descriptor: Arc<ProjectDescriptor>,
    ) -> Result<NodeId, ResolveError> {
        let incoming = format!("{} {}", descriptor.name, descriptor.version);
        if let Some(id) = self.existing(&dir, incoming, |existing| match existing.descriptor() {
            Some(d) if **d == *descriptor => Ok(()),
            Some(d) => Err(format!("{} {}", d.name, d.version)),
            None => Err(format!("library `{}`", existing.name())),
        })? {
            return Ok(id);
        }

        self.claim_name(NameSpace::Project, &descriptor.name, &dir)?;
        Ok(self.add(Node::Project(ProjectNode { dir, descriptor })))
    }

    /// Insert a library, or return the existing node for its directory.
    ///
    /// Two names that resolve to the same directory collapse to one node.
    pub fn insert_library(&mut self, library: LibraryNode) -> Result<NodeId, ResolveError> {
        let incoming = format!("{} at {}", library.mode, library.location.display());
        if let Some(id) = self.existing(&library.dir, incoming, |existing| match existing {
            Node::Library(l) if l.same_resolution(&library) && l.project == library.project => {
                Ok(())
            }
            Node::Library(l) => Err(format!("{} at {}", l.mode, l.location.display())),
            Node::Project(p) => match &library.project {
                Some(d) if *d == p.descriptor => Ok(()),
                _ => Err(format!("project `{}`", p.descriptor.name)),
            },
        })? {
            self.claim_name(NameSpace::Library, &library.name, &library.dir)?;
            return Ok(id);
        }

        self.claim_name(NameSpace::Library, &library.name, &library.dir)?;
        if let Some(descriptor) = &library.project {
            self.claim_name(NameSpace::Project, &descriptor.name, &library.dir)?;
        }
        Ok(self.add(Node::Library(library)))
    }

    /// Look up the node at `dir`, running `agrees` against it. `agrees`
    /// returns a description of the existing content when it conflicts;
    /// `incoming` describes the content being inserted.
    fn existing(
        &self,
        dir: &Path,
        incoming: String,
        agrees: impl FnOnce(&Node) -> Result<(), String>,
    ) -> Result<Option<NodeId>, ResolveError> {
        let Some(&id) = self.by_dir.get(dir) else {
            return Ok(None);
        };

        let existing = &self.graph[id];
        agrees(existing).map_err(|first| ResolveError::DuplicateIdentityConflict {
            identity: dir.display().to_string(),
            first,
            second: incoming,
        })?;

        Ok(Some(id))
    }

    fn claim_name(&mut self, space: NameSpace, name: &str, dir: &Path) -> Result<(), ResolveError> {
        let names = match space {
            NameSpace::Project => &mut self.project_names,
            NameSpace::Library => &mut self.library_names,
        };

        match names.get(name) {
            Some(claimed) if claimed != dir => Err(ResolveError::DuplicateIdentityConflict {
                identity: name.to_string(),
                first: claimed.display().to_string(),
                second: dir.display().to_string(),
            }),
            Some(_) => Ok(()),
            None => {
                names.insert(name.to_string(), dir.to_path_buf());
                Ok(())
            }
        }
    }

    fn add(&mut self, node: Node) -> NodeId {
        let dir = node.identity().to_path_buf();
        let id = self.graph.add_node(node);
        self.by_dir.insert(dir, id);
        id
    }

    /// Add a dependency edge from `consumer` to `dependency`.
    /// Repeated edges between the same pair are ignored.
    pub fn add_edge(&mut self, consumer: NodeId, dependency: NodeId) {
        if !self.graph.contains_edge(consumer, dependency) {
            self.graph.add_edge(consumer, dependency, ());
        }
    }

    /// Get the node at a directory.
    pub fn node_at(&self, dir: &Path) -> Option<NodeId> {
        self.by_dir.get(dir).copied()
    }

    /// Get a node by id.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.graph[id]
    }

    /// All nodes in insertion order. The iterator is lazy and can be
    /// restarted by cloning it.
    pub fn all_nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> + Clone + '_ {
        self.graph.node_indices().map(move |id| (id, &self.graph[id]))
    }

    /// Direct dependencies of a node, in declaration order.
    pub fn edges_of(&self, id: NodeId) -> Vec<NodeId> {
        let mut edges: Vec<_> = self
            .graph
            .edges_directed(id, Direction::Outgoing)
            .map(|e| (e.id(), e.target()))
            .collect();
        edges.sort_by_key(|(edge, _)| *edge);
        edges.into_iter().map(|(_, target)| target).collect()
    }

    /// Nodes that depend directly on the given node.
    pub fn dependents(&self, id: NodeId) -> Vec<NodeId> {
        let mut dependents: Vec<_> = self
            .graph
            .neighbors_directed(id, Direction::Incoming)
            .collect();
        dependents.sort();
        dependents
    }

    /// Get the number of nodes.
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Check the DAG invariant.
    pub fn is_acyclic(&self) -> bool {
        !petgraph::algo::is_cyclic_directed(&self.graph)
    }
}

#[derive(Debug, Clone, Copy)]
enum NameSpace {
    Project,
    Library,
}
