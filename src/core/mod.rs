//! Core data structures for cmakegen.
//!
//! This module contains the input side of generation:
//! - Project and solution descriptors (`Project.json`, `Solution.json`)
//! - Workspace discovery (which descriptor, which solution root)

pub mod descriptor;
pub mod workspace;

pub use descriptor::{
    DescriptorError, ExecutableSpec, LibrarySpec, ProjectDescriptor, SolutionDescriptor,
    PROJECT_FILE, SOLUTION_FILE,
};
pub use workspace::{find_solution_root, Input, Workspace};
