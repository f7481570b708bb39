//! Query commands: search, symbols, stats and duplicates
//!
//! @module cli/query

use anyhow::bail;
use serde::Serialize;

use crate::cli::{open_manager, ProjectArgs, SearchArgs, SymbolsArgs};
use crate::index::{
    analyze_duplicate_relationships, format_duplicate_report, get_duplicate_statistics,
    CodeIndex, IndexManager,
};
use crate::index::duplicates::{DuplicateRelationships, DuplicateStatistics};
use crate::output::{self, OutputFormat};

fn current(manager: &IndexManager) -> anyhow::Result<std::sync::Arc<CodeIndex>> {
    match manager.index() {
        Some(index) => match index.build_error() {
            Some(error) => bail!("Index could not be built: {}", error),
            None => Ok(index),
        },
        None => bail!("No index available for {}", manager.root().display()),
    }
}

/// Run the search command
pub fn run_search(args: SearchArgs) -> anyhow::Result<()> {
    let manager = open_manager(args.common.project.as_ref())?;
    current(&manager)?;

    let mut matches = manager.search(&args.query, args.kind);
    matches.truncate(args.limit);

    let format = OutputFormat::from_json_flag(args.common.json);
    print!("{}", output::format_matches(&args.query, &matches, format));
    if args.common.json {
        println!();
    }
    Ok(())
}

/// Run the symbols command
pub fn run_symbols(args: SymbolsArgs) -> anyhow::Result<()> {
    let manager = open_manager(args.common.project.as_ref())?;
    current(&manager)?;

    let Some(symbols) = manager.symbols_in_file(&args.file) else {
        bail!("File not in index: {}", args.file);
    };

    let format = OutputFormat::from_json_flag(args.common.json);
    print!("{}", output::format_symbols(&symbols, format));
    if args.common.json {
        println!();
    }
    Ok(())
}

/// Run the stats command
pub fn run_stats(args: ProjectArgs) -> anyhow::Result<()> {
    let manager = open_manager(args.project.as_ref())?;
    current(&manager)?;

    let Some(stats) = manager.stats() else {
        bail!("No index available for {}", manager.root().display());
    };
    if args.json {
        println!("{}", output::json::format(&stats));
    } else {
        println!("{}", stats);
    }
    Ok(())
}

#[derive(Serialize)]
struct DuplicatesOutput {
    statistics: DuplicateStatistics,
    relationships: DuplicateRelationships,
}

/// Run the duplicates command
pub fn run_duplicates(args: ProjectArgs) -> anyhow::Result<()> {
    let manager = open_manager(args.project.as_ref())?;
    let index = current(&manager)?;

    if args.json {
        let report = DuplicatesOutput {
            statistics: get_duplicate_statistics(&index),
            relationships: analyze_duplicate_relationships(&index),
        };
        println!("{}", output::json::format(&report));
    } else {
        println!("{}", format_duplicate_report(&index));
    }
    Ok(())
}
