//! cmakegen CLI - generate CMake scripts from JSON project descriptions

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cmakegen::util::diagnostic;
use cmakegen::{GlobalContext, ResolveError};

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    let ctx = match GlobalContext::new() {
        Ok(ctx) => ctx.with_verbose(cli.verbose).with_color(!cli.no_color),
        Err(e) => {
            eprintln!("error: {:#}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(cli.command, &ctx) {
        match e.downcast_ref::<ResolveError>() {
            Some(err) => diagnostic::emit(&err.to_diagnostic(), ctx.color()),
            None => eprintln!("error: {:#}", e),
        }
        std::process::exit(1);
    }
}

fn run(command: Commands, ctx: &GlobalContext) -> Result<()> {
    // Set up logging
    let filter = if ctx.is_verbose() {
        EnvFilter::new("cmakegen=debug")
    } else {
        EnvFilter::new("cmakegen=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_ansi(ctx.color())
        .with_writer(std::io::stderr)
        .init();

    match command {
        Commands::Generate(args) => commands::generate::execute(args, ctx),
        Commands::Plan(args) => commands::plan::execute(args, ctx),
        Commands::Tree(args) => commands::tree::execute(args, ctx),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
