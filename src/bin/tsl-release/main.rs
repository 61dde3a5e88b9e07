//! tsl-release CLI - release driver for header-only libraries

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};
use tsl_release::GlobalContext;

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("tsl_release=debug")
    } else {
        EnvFilter::new("tsl_release=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Completions(args) => commands::completions::execute(args),
        command => {
            let ctx = context(cli.source, cli.config)?;
            match command {
                Commands::Run(args) => commands::run::execute(&ctx, args),
                Commands::Version => commands::version::execute(&ctx),
                Commands::Info(args) => commands::info::execute(&ctx, args),
                Commands::Matrix(args) => commands::matrix::execute(&ctx, args),
                Commands::Package(args) => commands::package::execute(&ctx, args),
                Commands::Completions(_) => unreachable!("handled above"),
            }
        }
    }
}

fn context(source: Option<PathBuf>, config: Option<PathBuf>) -> Result<GlobalContext> {
    match source {
        Some(source) => GlobalContext::with_source_dir(source, config),
        None => {
            let cwd = std::env::current_dir().context("failed to get current directory")?;
            GlobalContext::with_source_dir(cwd, config)
        }
    }
}
