//! Dependency resolution.
//!
//! Turns project descriptors into a [`BuildGraph`] using nothing but
//! filesystem evidence:
//! - [`probe`] classifies third-party directories by their marker files
//! - [`resolve`] walks declared dependencies and guards against cycles
//! - [`graph`] holds the deduplicated nodes and ordered edges

pub mod errors;
pub mod graph;
pub mod probe;
pub mod resolve;

pub use errors::ResolveError;
pub use graph::{BuildGraph, Node, NodeId, NodeKind, ProjectNode};
pub use probe::{LibraryNode, LibraryProbe, ResolutionMode};
pub use resolve::{Resolver, SearchRoots};
