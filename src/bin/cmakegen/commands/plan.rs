//! `cmakegen plan` command

use anyhow::Result;

use crate::cli::PlanArgs;
use crate::commands::load_workspace;
use cmakegen::builder::{EmissionPlan, PlanEntry, Visibility};
use cmakegen::ops::resolve_workspace;
use cmakegen::util::RealFs;
use cmakegen::GlobalContext;

pub fn execute(args: PlanArgs, ctx: &GlobalContext) -> Result<()> {
    let (ws, config) = load_workspace(args.input.as_deref(), ctx)?;

    let resolved = resolve_workspace(&RealFs, &ws, &config)?;
    let plan = resolved.plan()?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        print_plan(&plan);
    }

    Ok(())
}

fn print_plan(plan: &EmissionPlan) {
    for (index, entry) in plan.entries().iter().enumerate() {
        println!("{:>3}. {}", index + 1, describe(entry));

        for edge in &entry.edges {
            let marker = match edge.visibility {
                Visibility::Normal => "",
                Visibility::BuildTimeOnly => " (build-time only)",
            };
            println!("       -> {}{}", edge.name, marker);
        }
    }
}

fn describe(entry: &PlanEntry) -> String {
    match entry.mode {
        Some(mode) => format!("{} [{}] {}", entry.name, mode, entry.identity.display()),
        None => format!("{} {}", entry.name, entry.identity.display()),
    }
}
