//! High-level operations.
//!
//! This module contains the implementation of cmakegen commands.

pub mod generate;
pub mod resolve;

pub use generate::{generate, GenerateOptions, GenerateResult};
pub use resolve::{project_dirs, resolve_workspace, ResolvedWorkspace};
