//! codeindex CLI entry point

use clap::Parser;
use codeindex::cli::{Cli, Commands};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so --json output stays clean
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_env("CODEINDEX_LOG"))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Index(args) => codeindex::cli::index::run(args),
        Commands::Search(args) => codeindex::cli::query::run_search(args),
        Commands::Symbols(args) => codeindex::cli::query::run_symbols(args),
        Commands::Stats(args) => codeindex::cli::query::run_stats(args),
        Commands::Duplicates(args) => codeindex::cli::query::run_duplicates(args),
        Commands::Validate(args) => codeindex::cli::index::run_validate(args),
        Commands::Watch(args) => codeindex::cli::watch::run(args),
    }
}
