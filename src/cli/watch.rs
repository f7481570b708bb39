//! Watch command
//!
//! @module cli/watch

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::Context;

use crate::cli::{resolve_project, WatchArgs};
use crate::core::config::Config;
use crate::index::IndexManager;
use crate::watch::ChangeWatcher;

/// Build the index, then rebuild it on every relevant change until killed
pub fn run(args: WatchArgs) -> anyhow::Result<()> {
    let project = resolve_project(args.project.as_ref())?;
    let config = Config::load().context("Failed to load configuration")?;
    let tick = Duration::from_millis(config.watch.poll_interval_ms.max(100));

    let manager = Arc::new(IndexManager::new(&project.root, config));
    manager
        .refresh(false)
        .with_context(|| format!("Failed to index {}", project.root.display()))?;

    let _watcher = ChangeWatcher::start(Arc::clone(&manager))
        .with_context(|| format!("Failed to watch {}", project.root.display()))?;
    println!("Watching {} (Ctrl-C to stop)", project.root.display());

    loop {
        thread::sleep(tick);
    }
}
