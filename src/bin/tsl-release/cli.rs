//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use tsl_release::MatrixFilter;

/// tsl-release - build, package and publish a header-only library
#[derive(Parser)]
#[command(name = "tsl-release")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Library source root (defaults to the current directory)
    #[arg(long, global = true, env = "TSL_RELEASE_SOURCE")]
    pub source: Option<PathBuf>,

    /// Project config file (defaults to <source>/release.toml)
    #[arg(long, global = true, env = "TSL_RELEASE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build the matrix and publish on a release trigger
    Run(RunArgs),

    /// Print the library version read from the build metadata
    Version,

    /// Show the package metadata
    Info(InfoArgs),

    /// Show the build configurations a run would build
    Matrix(MatrixArgs),

    /// Stage the package into a directory
    Package(PackageArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args, Clone)]
pub struct MatrixSelection {
    /// Build every configuration, even for a header-only package
    #[arg(long)]
    pub full_matrix: bool,

    /// Only keep configurations with this setting (e.g. build_type=Release)
    #[arg(long = "filter", value_name = "KEY=VALUE")]
    pub filters: Vec<MatrixFilter>,
}

#[derive(Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub selection: MatrixSelection,

    /// Never publish, even when the release trigger is set
    #[arg(long)]
    pub dry_run: bool,

    /// Directory to stage packages in
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct InfoArgs {
    /// Print as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct MatrixArgs {
    #[command(flatten)]
    pub selection: MatrixSelection,

    /// Print as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct PackageArgs {
    /// Output directory (recreated)
    pub output: PathBuf,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: Shell,
}
