//! CLI command definitions and handlers

pub mod index;
pub mod query;
pub mod watch;

use std::env;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::debug;

use crate::core::config::Config;
use crate::core::project::Project;
use crate::index::{IndexManager, SymbolKind};

const LONG_ABOUT: &str = r#"
Cross-file code index: declarations, qualified names and a heuristic
call / instantiation / import graph for a project tree.

QUICK START:
    1. codeindex index             Build the index for the current project
    2. codeindex search <query>    Find functions, classes and imports
    3. codeindex symbols <file>    List declarations of one file

EXAMPLES:
    codeindex index --force                Rebuild even if fresh
    codeindex search parse --kind function Functions matching 'parse'
    codeindex search App --json            JSON output for scripting
    codeindex duplicates                   Names declared in several files
    codeindex watch                        Rebuild on every source change
"#;

/// Cross-file code index
#[derive(Parser, Debug)]
#[command(name = "codeindex")]
#[command(author, version)]
#[command(about = "Cross-file code index with qualified names")]
#[command(long_about = LONG_ABOUT)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build (or refresh) the index for a project
    #[command(visible_alias = "i")]
    Index(IndexArgs),

    /// Search symbol names (case-insensitive substring)
    #[command(visible_alias = "s")]
    Search(SearchArgs),

    /// List the declarations of one file
    Symbols(SymbolsArgs),

    /// Summary counts for the index
    Stats(ProjectArgs),

    /// Report names declared in more than one file
    Duplicates(ProjectArgs),

    /// Validate the persisted index
    Validate(ProjectArgs),

    /// Watch the project and rebuild on changes
    #[command(visible_alias = "w")]
    Watch(WatchArgs),
}

/// Options shared by every command
#[derive(Args, Debug, Clone)]
pub struct ProjectArgs {
    /// Project path (default: current directory)
    #[arg(short, long)]
    pub project: Option<PathBuf>,

    /// JSON output
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the index command
#[derive(Args, Debug)]
#[command(after_help = "EXAMPLES:
    codeindex index              Index current project
    codeindex index -p ~/code    Index specific directory
    codeindex index --force      Rebuild even when the index is fresh")]
pub struct IndexArgs {
    #[command(flatten)]
    pub common: ProjectArgs,

    /// Rebuild even when the persisted index is fresh
    #[arg(short, long)]
    pub force: bool,
}

/// Arguments for the search command
#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Search query
    pub query: String,

    /// Restrict to one kind: function, class or import
    #[arg(short, long)]
    pub kind: Option<SymbolKind>,

    /// Max results
    #[arg(short = 'n', long, default_value = "50")]
    pub limit: usize,

    #[command(flatten)]
    pub common: ProjectArgs,
}

/// Arguments for the symbols command
#[derive(Args, Debug)]
pub struct SymbolsArgs {
    /// Project-relative file path
    pub file: String,

    #[command(flatten)]
    pub common: ProjectArgs,
}

/// Arguments for the watch command
#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Project path (default: current directory)
    #[arg(short, long)]
    pub project: Option<PathBuf>,
}

/// Resolve the project root from `--project` or the current directory
pub fn resolve_project(project: Option<&PathBuf>) -> anyhow::Result<Project> {
    let start = match project {
        Some(p) => p.clone(),
        None => env::current_dir().context("Failed to get current directory")?,
    };
    let project = Project::detect(&start)
        .with_context(|| format!("Could not find a project at {}", start.display()))?;
    debug!(project = %project.name, root = %project.root.display(), "Detected project");
    Ok(project)
}

/// Manager for the project with its index loaded, building it if needed
pub fn open_manager(project: Option<&PathBuf>) -> anyhow::Result<IndexManager> {
    let project = resolve_project(project)?;
    let config = Config::load().context("Failed to load configuration")?;
    let manager = IndexManager::new(&project.root, config);
    manager
        .refresh(false)
        .with_context(|| format!("Failed to prepare index for {}", project.root.display()))?;
    Ok(manager)
}
