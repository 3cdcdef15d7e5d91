//! cmakegen - CMake script generation for native-code solutions
//!
//! This crate provides the core library functionality for cmakegen,
//! including library probing, dependency resolution, emission planning and
//! script rendering.

pub mod builder;
pub mod core;
pub mod ops;
pub mod resolver;
pub mod util;

/// Test utilities and mocks for cmakegen unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It provides an in-memory filesystem and descriptor
/// fixtures.
#[cfg(test)]
pub mod test_support;

pub use builder::{EmissionPlan, Visibility};
pub use core::{ProjectDescriptor, SolutionDescriptor, Workspace};
pub use resolver::{BuildGraph, ResolutionMode, ResolveError};
pub use util::context::GlobalContext;
