//! Index and validate commands
//!
//! @module cli/index

use std::time::Instant;

use anyhow::{bail, Context};
use tracing::info;

use crate::cli::{resolve_project, IndexArgs, ProjectArgs};
use crate::core::config::Config;
use crate::index::{BuildStats, IndexManager};
use crate::output::{self, OutputFormat};

/// Run the index command
pub fn run(args: IndexArgs) -> anyhow::Result<()> {
    let project = resolve_project(args.common.project.as_ref())?;
    let config = Config::load().context("Failed to load configuration")?;
    info!(project = %project.name, root = %project.root.display(), "Indexing project");

    let start = Instant::now();
    let manager = IndexManager::new(&project.root, config);
    let rebuilt = manager
        .refresh(args.force)
        .with_context(|| format!("Failed to index {}", project.root.display()))?;

    let Some(index) = manager.index() else {
        bail!("No index available for {}", project.root.display());
    };
    if let Some(error) = index.build_error() {
        bail!("Indexing {} failed: {}", project.root.display(), error);
    }

    if args.common.json {
        println!("{}", output::json::format(&index.project_metadata));
        return Ok(());
    }

    let stats = BuildStats::of(&index);
    if rebuilt {
        println!(
            "Indexed {} files ({} functions, {} classes) in {:.2}s",
            stats.files,
            stats.functions,
            stats.classes,
            start.elapsed().as_secs_f64()
        );
    } else {
        println!("Index is up to date ({} files)", stats.files);
    }
    if stats.files_with_errors > 0 {
        println!("{} files had analysis errors", stats.files_with_errors);
    }
    let report = &index.index_metadata.validation;
    if !report.is_valid() {
        println!("Validation found {} errors (run 'codeindex validate')", report.errors.len());
    }
    println!("Index: {}", manager.index_path().display());
    Ok(())
}

/// Run the validate command against the persisted index
pub fn run_validate(args: ProjectArgs) -> anyhow::Result<()> {
    let project = resolve_project(args.project.as_ref())?;
    let config = Config::load().context("Failed to load configuration")?;
    let manager = IndexManager::new(&project.root, config);

    let loaded = manager
        .load()
        .with_context(|| format!("Failed to load index {}", manager.index_path().display()))?;
    if !loaded {
        bail!("No index for {}. Run 'codeindex index' first.", project.root.display());
    }
    let Some(index) = manager.index() else {
        bail!("No index for {}", project.root.display());
    };

    let report = &index.index_metadata.validation;
    print!("{}", output::format_report(report, OutputFormat::from_json_flag(args.json)));
    if args.json {
        println!();
    }
    if !report.is_valid() {
        bail!("Index is invalid");
    }
    Ok(())
}
