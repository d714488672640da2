//! Packwright CLI - compile installer manifests

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    // Parse CLI
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("packwright=debug")
    } else {
        EnvFilter::new("packwright=info")
    };

    // Logs go to stderr so `--emit-json -` keeps stdout clean.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_ansi(!cli.no_color)
        .with_writer(std::io::stderr)
        .init();

    // Execute command
    match cli.command {
        Commands::Compile(args) => commands::compile::execute(args, !cli.no_color),
        Commands::Scan(args) => commands::scan::execute(args),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
