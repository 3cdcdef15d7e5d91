//! Resolution error types and diagnostics.

use std::path::PathBuf;

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::core::DescriptorError;
use crate::util::diagnostic::{suggestions, Diagnostic};

/// Error during dependency resolution or planning.
///
/// Every variant aborts the run; nothing is emitted for a graph that failed
/// to resolve.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum ResolveError {
    #[error("could not resolve dependency `{name}` of `{consumer}`")]
    #[diagnostic(code(cmakegen::resolve::unresolved))]
    DependencyUnresolved {
        name: String,
        consumer: String,
        searched: Vec<PathBuf>,
    },

    #[error("cyclic dependency: {}", cycle.join(" -> "))]
    #[diagnostic(code(cmakegen::resolve::cycle))]
    CyclicDependency { cycle: Vec<String> },

    #[error("conflicting definitions for `{identity}`: {first} vs {second}")]
    #[diagnostic(code(cmakegen::resolve::identity_conflict))]
    DuplicateIdentityConflict {
        identity: String,
        first: String,
        second: String,
    },

    #[error(transparent)]
    #[diagnostic(code(cmakegen::descriptor::load))]
    DescriptorLoad(#[from] DescriptorError),
}

impl ResolveError {
    /// The diagnostic code of this error.
    pub fn code_str(&self) -> Option<String> {
        MietteDiagnostic::code(self).map(|c| c.to_string())
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let mut diag = Diagnostic::error(self.to_string());
        if let Some(code) = self.code_str() {
            diag = diag.with_code(code);
        }

        match self {
            ResolveError::DependencyUnresolved {
                name,
                consumer,
                searched,
            } => {
                diag = diag.with_context(format!("required by `{}`", consumer));
                if searched.is_empty() {
                    diag = diag.with_context("no search roots were configured");
                }
                for path in searched {
                    diag = diag.with_context(format!("searched: {}", path.display()));
                }
                diag.with_suggestion(suggestions::UNRESOLVED_DEPENDENCY.replace("<name>", name))
            }

            ResolveError::CyclicDependency { cycle } => diag
                .with_context(format!("cycle: {}", cycle.join(" -> ")))
                .with_suggestion("Break the cycle by removing or restructuring dependencies")
                .with_suggestion(suggestions::CYCLE),

            ResolveError::DuplicateIdentityConflict { identity, .. } => diag.with_suggestion(
                format!("Make `{}` resolve to a single definition across the solution", identity),
            ),

            ResolveError::DescriptorLoad(err) => match err {
                DescriptorError::NotFound { path }
                | DescriptorError::Io { path, .. }
                | DescriptorError::Parse { path, .. }
                | DescriptorError::Invalid { path, .. } => diag.with_location(path.clone()),
            },
        }
    }
}
