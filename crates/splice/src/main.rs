//! Splice CLI - content-inclusion engine.
//!
//! Provides commands for:
//! - `expand`: Expand `::include` directives in documents
//! - `include`: Resolve a single directive and print the result

mod commands;
mod compose;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{ExpandArgs, IncludeArgs};
use output::Output;

/// Splice - content-inclusion engine.
#[derive(Parser)]
#[command(name = "splice", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Expand inclusion directives in documents.
    Expand(ExpandArgs),
    /// Resolve a single directive given as JSON.
    Include(IncludeArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    let verbose = match &cli.command {
        Commands::Expand(args) => args.common.verbose,
        Commands::Include(args) => args.common.verbose,
    };

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Expand(args) => args.execute(),
        Commands::Include(args) => args.execute(),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
