//! `cmakegen tree` command

use std::collections::HashSet;

use anyhow::Result;

use crate::cli::TreeArgs;
use crate::commands::load_workspace;
use cmakegen::ops::resolve_workspace;
use cmakegen::resolver::{BuildGraph, Node, NodeId};
use cmakegen::util::RealFs;
use cmakegen::GlobalContext;

pub fn execute(args: TreeArgs, ctx: &GlobalContext) -> Result<()> {
    let (ws, config) = load_workspace(args.input.as_deref(), ctx)?;

    let resolved = resolve_workspace(&RealFs, &ws, &config)?;

    let mut seen = HashSet::new();
    for &root in &resolved.roots {
        print_tree(&resolved.graph, root, 0, args.depth.unwrap_or(usize::MAX), &mut seen);
    }

    Ok(())
}

fn print_tree(graph: &BuildGraph, id: NodeId, depth: usize, max_depth: usize, seen: &mut HashSet<NodeId>) {
    if depth > max_depth {
        return;
    }

    let is_duplicate = !seen.insert(id);

    let prefix = if depth == 0 {
        String::new()
    } else {
        format!("{}├── ", "│   ".repeat(depth - 1))
    };

    let node = graph.node(id);
    let label = match node {
        Node::Project(p) => format!("{} v{}", p.descriptor.name, p.descriptor.version),
        Node::Library(l) => format!("{} [{}]", l.name, l.mode),
    };
    let dup_marker = if is_duplicate { " (*)" } else { "" };

    println!("{}{}{}", prefix, label, dup_marker);

    // Don't recurse into duplicates
    if is_duplicate {
        return;
    }

    for dep in graph.edges_of(id) {
        print_tree(graph, dep, depth + 1, max_depth, seen);
    }
}
