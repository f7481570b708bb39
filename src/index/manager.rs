//! Index Lifecycle Manager
//!
//! Owns the current index for one project root, decides when it is stale,
//! rebuilds and persists it, and serves read queries from the in-memory
//! copy. Refreshes are serialized; readers hold an `Arc` snapshot and are
//! never blocked by a rebuild in progress.
//!
//! @module index/manager

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use super::builder::build_index;
use super::query::{find_symbols_in_file, get_stats, search_symbols, FileSymbols, IndexStats, SymbolMatch};
use super::storage::IndexStore;
use super::types::{CodeIndex, SymbolKind};
use crate::core::config::Config;
use crate::core::error::Result;
use crate::scan::FileWalker;
use crate::strategy::StrategyRegistry;

/// Lifecycle state of a managed index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexState {
    Uninitialized,
    Building,
    Ready,
}

impl IndexState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Building => "building",
            Self::Ready => "ready",
        }
    }
}

pub struct IndexManager {
    root: PathBuf,
    config: Config,
    strategies: StrategyRegistry,
    store: IndexStore,
    state: RwLock<IndexState>,
    current: RwLock<Option<Arc<CodeIndex>>>,
    refresh_lock: Mutex<()>,
}

impl IndexManager {
    pub fn new(root: impl Into<PathBuf>, config: Config) -> Self {
        Self::with_strategies(root, config, StrategyRegistry::default())
    }

    pub fn with_strategies(root: impl Into<PathBuf>, config: Config, strategies: StrategyRegistry) -> Self {
        let root = root.into();
        let store = IndexStore::new(config.index_path(&root));
        Self {
            root,
            config,
            strategies,
            store,
            state: RwLock::new(IndexState::Uninitialized),
            current: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn index_path(&self) -> &Path {
        self.store.path()
    }

    pub fn state(&self) -> IndexState {
        *self.state.read()
    }

    /// Snapshot of the current index
    pub fn index(&self) -> Option<Arc<CodeIndex>> {
        self.current.read().clone()
    }

    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    /// Load the persisted index into memory.
    ///
    /// Returns `false` when nothing has been persisted yet.
    pub fn load(&self) -> Result<bool> {
        if !self.store.exists() {
            debug!(path = %self.store.path().display(), "No persisted index");
            return Ok(false);
        }

        let index = self.store.load()?;
        info!(
            root = %self.root.display(),
            files = index.files.len(),
            version = index.index_metadata.version.as_str(),
            "Loaded persisted index"
        );
        self.install(index);
        Ok(true)
    }

    /// Whether the persisted index is at least as new as every indexable
    /// source file under the root
    pub fn is_fresh(&self) -> bool {
        let Some(index_modified) = self.store.modified() else {
            return false;
        };

        match FileWalker::new(&self.root, &self.config).latest_modification() {
            Ok(Some(latest)) => index_modified >= latest,
            Ok(None) => true,
            Err(e) => {
                warn!(root = %self.root.display(), error = %e, "Could not check index freshness");
                false
            }
        }
    }

    /// Rebuild and persist the index when stale (or when forced).
    ///
    /// Returns `true` if a rebuild happened. A fresh persisted index is
    /// loaded into memory if nothing is loaded yet; one that cannot be
    /// loaded is rebuilt.
    pub fn refresh(&self, force: bool) -> Result<bool> {
        let _guard = self.refresh_lock.lock();

        if !force && self.is_fresh() {
            let loaded = if self.current.read().is_some() {
                true
            } else {
                match self.load() {
                    Ok(loaded) => loaded,
                    Err(e) => {
                        warn!(
                            path = %self.store.path().display(),
                            error = %e,
                            "Persisted index could not be loaded, rebuilding"
                        );
                        false
                    }
                }
            };
            if loaded {
                debug!(root = %self.root.display(), "Index is fresh");
                return Ok(false);
            }
        }

        *self.state.write() = IndexState::Building;
        info!(root = %self.root.display(), force, "Rebuilding index");

        let index = build_index(&self.root, &self.config, &self.strategies);
        if let Some(error) = index.build_error() {
            warn!(root = %self.root.display(), error, "Index built with errors");
        }

        let saved = self.store.save(&index);
        self.install(index);
        saved?;
        Ok(true)
    }

    fn install(&self, index: CodeIndex) {
        *self.current.write() = Some(Arc::new(index));
        *self.state.write() = IndexState::Ready;
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    pub fn search(&self, query: &str, kind: Option<SymbolKind>) -> Vec<SymbolMatch> {
        self.index()
            .map(|index| search_symbols(&index, query, kind))
            .unwrap_or_default()
    }

    pub fn symbols_in_file(&self, path: &str) -> Option<FileSymbols> {
        self.index().and_then(|index| find_symbols_in_file(&index, path))
    }

    pub fn stats(&self) -> Option<IndexStats> {
        self.index().map(|index| get_stats(&index))
    }
}

impl std::fmt::Debug for IndexManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexManager")
            .field("root", &self.root)
            .field("index_path", &self.store.path())
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::qualified::generate_qualified_name;
    use std::collections::BTreeSet;
    use std::fs::{self, File};
    use std::time::{Duration, SystemTime};
    use tempfile::{tempdir, TempDir};

    struct Fixture {
        project: TempDir,
        _storage: TempDir,
        manager: IndexManager,
    }

    fn fixture() -> Fixture {
        let project = tempdir().unwrap();
        let storage = tempdir().unwrap();
        fs::write(project.path().join("a.py"), "def foo():\n    bar()\n").unwrap();
        fs::write(project.path().join("b.py"), "class Bar:\n    pass\n\ndef bar():\n    Bar()\n").unwrap();

        let mut config = Config::default();
        config.index.storage_dir = Some(storage.path().to_path_buf());
        let manager = IndexManager::new(project.path(), config);
        Fixture {
            project,
            _storage: storage,
            manager,
        }
    }

    fn qualified_names(index: &CodeIndex) -> BTreeSet<String> {
        index
            .files
            .iter()
            .flat_map(|f| {
                f.functions
                    .iter()
                    .map(|s| s.name.as_str())
                    .chain(f.classes.iter().map(|c| c.name.as_str()))
                    .map(|name| generate_qualified_name(&f.file.path, name))
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    fn set_index_age(manager: &IndexManager, age: Duration) {
        let file = File::options().write(true).open(manager.index_path()).unwrap();
        file.set_modified(SystemTime::now() - age).unwrap();
    }

    #[test]
    fn test_states() {
        let fx = fixture();
        assert_eq!(fx.manager.state(), IndexState::Uninitialized);
        assert!(fx.manager.index().is_none());
        assert!(!fx.manager.load().unwrap());
        assert!(fx.manager.search("foo", None).is_empty());

        assert!(fx.manager.refresh(false).unwrap());
        assert_eq!(fx.manager.state(), IndexState::Ready);
        assert!(fx.manager.index_path().is_file());
        assert_eq!(fx.manager.stats().unwrap().file_count, 2);
    }

    #[test]
    fn test_refresh_is_deterministic() {
        let fx = fixture();

        fx.manager.refresh(true).unwrap();
        let first = fx.manager.index().unwrap();
        fx.manager.refresh(true).unwrap();
        let second = fx.manager.index().unwrap();

        let paths = |index: &CodeIndex| -> Vec<String> { index.files.iter().map(|f| f.file.path.clone()).collect() };
        assert_eq!(paths(&*first), paths(&*second));
        assert_eq!(qualified_names(&first), qualified_names(&second));
        assert_eq!(first.lookups, second.lookups);
        assert_eq!(first.reverse_lookups, second.reverse_lookups);
    }

    #[test]
    fn test_freshness() {
        let fx = fixture();
        assert!(!fx.manager.is_fresh());

        assert!(fx.manager.refresh(false).unwrap());
        assert!(fx.manager.is_fresh());
        assert!(!fx.manager.refresh(false).unwrap());

        // A source file newer than the persisted index makes it stale
        set_index_age(&fx.manager, Duration::from_secs(3600));
        assert!(!fx.manager.is_fresh());
        assert!(fx.manager.refresh(false).unwrap());
        assert!(fx.manager.is_fresh());

        assert!(fx.manager.refresh(true).unwrap());
    }

    #[test]
    fn test_new_file_picked_up() {
        let fx = fixture();
        fx.manager.refresh(false).unwrap();
        set_index_age(&fx.manager, Duration::from_secs(3600));

        fs::write(fx.project.path().join("c.py"), "def baz():\n    foo()\n").unwrap();
        assert!(fx.manager.refresh(false).unwrap());

        let hits = fx.manager.search("baz", Some(SymbolKind::Function));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].qualified_name, "c.py:baz");
        let symbols = fx.manager.symbols_in_file("a.py").unwrap();
        assert!(symbols.functions[0].called_by.contains(&"c.py:baz".to_string()));
    }

    #[test]
    fn test_load_after_refresh() {
        let fx = fixture();
        fx.manager.refresh(true).unwrap();
        let built = fx.manager.index().unwrap();

        let other = IndexManager::new(fx.project.path(), fx.manager.config().clone());
        assert!(other.load().unwrap());
        let loaded = other.index().unwrap();
        assert_eq!(loaded.files, built.files);
        assert_eq!(loaded.reverse_lookups, built.reverse_lookups);

        // A fresh persisted index is loaded rather than rebuilt
        let third = IndexManager::new(fx.project.path(), fx.manager.config().clone());
        assert!(!third.refresh(false).unwrap());
        assert_eq!(third.state(), IndexState::Ready);
        assert_eq!(third.index().unwrap().files, built.files);
    }

    #[test]
    fn test_unloadable_index_is_rebuilt() {
        let fx = fixture();
        fx.manager.refresh(true).unwrap();

        for corrupt in ["{not json", r#"{"index_metadata": {"version": "2.0"}}"#] {
            fs::write(fx.manager.index_path(), corrupt).unwrap();
            assert!(fx.manager.is_fresh());

            let other = IndexManager::new(fx.project.path(), fx.manager.config().clone());
            assert!(other.refresh(false).unwrap(), "{}", corrupt);
            assert_eq!(other.state(), IndexState::Ready);
            assert_eq!(other.stats().unwrap().file_count, 2);

            // The rebuilt document loads again
            let reloaded = IndexManager::new(fx.project.path(), fx.manager.config().clone());
            assert!(reloaded.load().unwrap());
        }
    }
}
