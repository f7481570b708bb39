//! File system watcher
//!
//! Any relevant change under a project root triggers a forced full refresh
//! of its index. There is no debouncing: each notification batch is handled
//! as it arrives and refreshes are serialized by the manager.
//!
//! @module watch

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{Config as NotifyConfig, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, error, info};

use crate::core::config::Config;
use crate::core::error::Result;
use crate::index::IndexManager;

/// Refresh the managed index if any of `paths` can affect it.
///
/// Returns `true` when a rebuild ran.
pub fn on_change(manager: &IndexManager, paths: &[PathBuf]) -> Result<bool> {
    let relevant: Vec<&PathBuf> = paths
        .iter()
        .filter(|p| is_relevant(manager.root(), manager.config(), p))
        .collect();

    if relevant.is_empty() {
        debug!(paths = paths.len(), "Ignoring irrelevant changes");
        return Ok(false);
    }

    info!(changed = relevant.len(), first = %relevant[0].display(), "Source changed, refreshing index");
    manager.refresh(true)
}

/// Under the root, outside skipped directories, with an indexed extension
fn is_relevant(root: &Path, config: &Config, path: &Path) -> bool {
    let Some(relative) = strip_root(root, path) else {
        return false;
    };

    let Some(extension) = relative.extension() else {
        return false;
    };
    if !config.is_supported_extension(&extension.to_string_lossy()) {
        return false;
    }

    let mut dirs = relative.parent().into_iter().flat_map(Path::components);
    !dirs.any(|c| match c {
        Component::Normal(name) => config.is_skipped_directory(&name.to_string_lossy()),
        _ => false,
    })
}

fn strip_root(root: &Path, path: &Path) -> Option<PathBuf> {
    if let Ok(relative) = path.strip_prefix(root) {
        return Some(relative.to_path_buf());
    }
    // Watchers report canonical paths; the root may not be
    let canonical = root.canonicalize().ok()?;
    path.strip_prefix(canonical).ok().map(Path::to_path_buf)
}

// =============================================================================
// WATCHER
// =============================================================================

/// Keeps a notify watcher alive and routes its events to `on_change`
pub struct ChangeWatcher {
    watcher: RecommendedWatcher,
    root: PathBuf,
}

impl ChangeWatcher {
    /// Start watching the manager's root recursively
    pub fn start(manager: Arc<IndexManager>) -> Result<Self> {
        let root = manager.root().to_path_buf();
        let poll_interval = Duration::from_millis(manager.config().watch.poll_interval_ms);

        let mut watcher = RecommendedWatcher::new(
            move |res: std::result::Result<Event, notify::Error>| match res {
                Ok(event) if is_content_change(&event.kind) => {
                    match on_change(&manager, &event.paths) {
                        Ok(true) => info!("Index refreshed"),
                        Ok(false) => {}
                        Err(e) => error!(error = %e, "Refresh after change failed"),
                    }
                }
                Ok(_) => {}
                Err(e) => error!(error = %e, "Watch error"),
            },
            NotifyConfig::default().with_poll_interval(poll_interval),
        )?;

        watcher.watch(&root, RecursiveMode::Recursive)?;
        info!(root = %root.display(), "Watching for changes");

        Ok(Self { watcher, root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Stop watching
    pub fn stop(mut self) {
        if let Err(e) = self.watcher.unwatch(&self.root) {
            debug!(root = %self.root.display(), error = %e, "Failed to unwatch");
        }
    }
}

fn is_content_change(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::IndexState;
    use notify::event::{AccessKind, CreateKind};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_relevance() {
        let config = Config::default();
        let root = Path::new("/work/project");
        let relevant = |p: &str| is_relevant(root, &config, Path::new(p));

        assert!(relevant("/work/project/src/app.py"));
        assert!(relevant("/work/project/lib.rs"));
        assert!(!relevant("/work/project/README.md"));
        assert!(!relevant("/work/project/node_modules/pkg/index.js"));
        assert!(!relevant("/work/project/.git/hooks/pre-commit.sh"));
        assert!(!relevant("/elsewhere/app.py"));
        assert!(!relevant("/work/project/Makefile"));
    }

    #[test]
    fn test_content_change_kinds() {
        assert!(is_content_change(&EventKind::Create(CreateKind::File)));
        assert!(!is_content_change(&EventKind::Access(AccessKind::Any)));
    }

    #[test]
    fn test_on_change_refreshes() {
        let project = tempdir().unwrap();
        let storage = tempdir().unwrap();
        fs::write(project.path().join("a.py"), "def a():\n    pass\n").unwrap();

        let mut config = Config::default();
        config.index.storage_dir = Some(storage.path().to_path_buf());
        let manager = IndexManager::new(project.path(), config);

        let ignored = vec![project.path().join("notes.txt")];
        assert!(!on_change(&manager, &ignored).unwrap());
        assert_eq!(manager.state(), IndexState::Uninitialized);

        let changed = vec![project.path().join("a.py")];
        assert!(on_change(&manager, &changed).unwrap());
        assert_eq!(manager.state(), IndexState::Ready);
        assert!(manager.index_path().is_file());
    }

    #[test]
    fn test_watcher_starts_and_stops() {
        let project = tempdir().unwrap();
        let storage = tempdir().unwrap();
        let mut config = Config::default();
        config.index.storage_dir = Some(storage.path().to_path_buf());

        let manager = Arc::new(IndexManager::new(project.path(), config));
        let watcher = ChangeWatcher::start(Arc::clone(&manager)).unwrap();
        assert_eq!(watcher.root(), project.path());
        watcher.stop();
    }

    #[test]
    fn test_stop_after_root_removed() {
        let parent = tempdir().unwrap();
        let storage = tempdir().unwrap();
        let root = parent.path().join("project");
        fs::create_dir(&root).unwrap();
        let mut config = Config::default();
        config.index.storage_dir = Some(storage.path().to_path_buf());

        let manager = Arc::new(IndexManager::new(&root, config));
        let watcher = ChangeWatcher::start(manager).unwrap();
        fs::remove_dir_all(&root).unwrap();

        // Unwatching a vanished root is logged, not raised
        watcher.stop();
    }
}
