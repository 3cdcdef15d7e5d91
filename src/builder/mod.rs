//! Build script generation.
//!
//! [`plan`] turns a resolved graph into a leaves-first emission order;
//! [`cmake`] renders that order into CMake scripts.

pub mod cmake;
pub mod plan;

pub use cmake::{CMakeEmitter, GeneratedFile, CMAKE_LISTS};
pub use plan::{edge_visibility, plan, EmissionPlan, PlanEntry, PlannedEdge, Visibility};
