//! `cmakegen generate` command

use anyhow::Result;

use crate::cli::GenerateArgs;
use crate::commands::load_workspace;
use cmakegen::ops::{generate, GenerateOptions};
use cmakegen::util::RealFs;
use cmakegen::GlobalContext;

pub fn execute(args: GenerateArgs, ctx: &GlobalContext) -> Result<()> {
    let (ws, config) = load_workspace(args.input.as_deref(), ctx)?;

    let opts = GenerateOptions {
        dry_run: args.dry_run,
    };
    let result = generate(&RealFs, &ws, &config, &opts)?;

    if args.dry_run {
        println!("{} file(s) would be generated", result.files.len());
    } else {
        println!(
            "Generated {} file(s) for {} project(s)",
            result.files.len(),
            result.plan.project_entries().count()
        );
    }

    Ok(())
}
