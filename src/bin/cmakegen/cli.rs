//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

/// cmakegen - Generate CMake build scripts from Project.json and Solution.json
#[derive(Parser)]
#[command(name = "cmakegen")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve dependencies and write CMakeLists.txt files
    Generate(GenerateArgs),

    /// Show the emission order and edge visibility
    Plan(PlanArgs),

    /// Display the dependency tree
    Tree(TreeArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct GenerateArgs {
    /// Solution.json, Project.json, or a directory containing one
    pub input: Option<PathBuf>,

    /// Show what would be generated without writing anything
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args)]
pub struct PlanArgs {
    /// Solution.json, Project.json, or a directory containing one
    pub input: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct TreeArgs {
    /// Solution.json, Project.json, or a directory containing one
    pub input: Option<PathBuf>,

    /// Maximum depth to display
    #[arg(short, long)]
    pub depth: Option<usize>,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: Shell,
}
