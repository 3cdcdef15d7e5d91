//! Command implementations

pub mod completions;
pub mod generate;
pub mod plan;
pub mod tree;

use std::path::Path;

use anyhow::Result;

use cmakegen::core::Workspace;
use cmakegen::util::config::Config;
use cmakegen::GlobalContext;

/// Discover the workspace for `input` and load its configuration.
pub fn load_workspace(input: Option<&Path>, ctx: &GlobalContext) -> Result<(Workspace, Config)> {
    let ws = Workspace::discover(ctx.cwd(), input)?;
    let config = ctx.load_config(ws.root());
    Ok((ws, config))
}
