//! Project file discovery
//!
//! @module scan/walker

use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use ignore::overrides::OverrideBuilder;
use ignore::{DirEntry, Walk, WalkBuilder};
use tracing::{debug, warn};

use crate::core::config::{normalize_extension, Config};
use crate::core::error::{Error, Result};
use crate::index::types::FileRecord;
use crate::strategy::detect_language;

/// A file that survived the ignore rules
#[derive(Debug, Clone)]
pub struct DiscoveredFile {
    /// Project-relative, `/`-separated
    pub path: String,
    pub extension: String,
    pub size: u64,
    pub modified: SystemTime,
}

/// Walks project files respecting .gitignore and the configured ignore policy
pub struct FileWalker<'a> {
    root: PathBuf,
    config: &'a Config,
}

impl<'a> FileWalker<'a> {
    pub fn new(root: &Path, config: &'a Config) -> Self {
        Self {
            root: root.to_path_buf(),
            config,
        }
    }

    /// Every non-ignored file under the root, sorted by path
    pub fn walk(&self) -> Result<Vec<DiscoveredFile>> {
        if !self.root.is_dir() {
            return Err(Error::ProjectNotFound {
                path: self.root.clone(),
            });
        }

        let mut files = Vec::new();
        for entry in self.build_walk()? {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    debug!(error = %e, "Skipping unwalkable entry");
                    continue;
                }
            };
            if let Some(file) = self.discovered(&entry) {
                files.push(file);
            }
        }

        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(files)
    }

    /// Turn the indexable subset of discovered files into records with
    /// sequential ids in path order
    pub fn records(&self, files: &[DiscoveredFile]) -> Vec<FileRecord> {
        let index = &self.config.index;
        let mut eligible: Vec<&DiscoveredFile> = files
            .iter()
            .filter(|f| self.config.is_supported_extension(&f.extension))
            .filter(|f| {
                let fits = f.size <= index.max_file_size;
                if !fits {
                    debug!(file = %f.path, size = f.size, "Skipping oversized file");
                }
                fits
            })
            .collect();

        if eligible.len() > index.max_files {
            warn!(
                found = eligible.len(),
                limit = index.max_files,
                "File limit reached, truncating"
            );
            eligible.truncate(index.max_files);
        }

        eligible
            .into_iter()
            .enumerate()
            .map(|(id, f)| FileRecord {
                id: id as u32,
                path: f.path.clone(),
                size: f.size,
                modified_time: DateTime::<Utc>::from(f.modified),
                language: detect_language(&f.extension).to_string(),
                extension: f.extension.clone(),
            })
            .collect()
    }

    /// Newest modification time among indexable files
    pub fn latest_modification(&self) -> Result<Option<SystemTime>> {
        let latest = self
            .walk()?
            .into_iter()
            .filter(|f| self.config.is_supported_extension(&f.extension))
            .map(|f| f.modified)
            .max();
        Ok(latest)
    }

    fn build_walk(&self) -> Result<Walk> {
        let mut overrides = OverrideBuilder::new(&self.root);
        for pattern in &self.config.ignore.patterns {
            overrides
                .add(&format!("!{}", pattern))
                .map_err(|e| Error::ConfigError {
                    message: format!("Invalid ignore pattern '{}': {}", pattern, e),
                })?;
        }
        let overrides = overrides.build().map_err(|e| Error::ConfigError {
            message: format!("Invalid ignore patterns: {}", e),
        })?;

        let config = self.config.clone();
        let walk = WalkBuilder::new(&self.root)
            .hidden(true)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .require_git(false)
            .overrides(overrides)
            .filter_entry(move |entry| {
                let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
                !(is_dir
                    && entry.depth() > 0
                    && config.is_skipped_directory(&entry.file_name().to_string_lossy()))
            })
            .build();
        Ok(walk)
    }

    fn discovered(&self, entry: &DirEntry) -> Option<DiscoveredFile> {
        if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            return None;
        }

        let path = entry.path();
        let extension = path
            .extension()
            .map(|e| normalize_extension(&e.to_string_lossy()))
            .unwrap_or_default();
        if self.config.is_skipped_extension(&extension) {
            return None;
        }

        let meta = match entry.metadata() {
            Ok(meta) => meta,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Skipping inaccessible file");
                return None;
            }
        };

        Some(DiscoveredFile {
            path: relative_path(&self.root, path)?,
            extension,
            size: meta.len(),
            modified: meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
        })
    }
}

/// `/`-separated path of `path` relative to `root`
pub fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<_> = rel
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect();
    (!parts.is_empty()).then(|| parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn touch(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn test_walk_applies_ignore_policy() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        touch(root, "src/b.py", "pass\n");
        touch(root, "src/a.py", "pass\n");
        touch(root, "node_modules/x/index.js", "1\n");
        touch(root, ".hidden/secret.py", "pass\n");
        touch(root, "build/out.py", "pass\n");
        touch(root, "logo.png", "png");
        touch(root, "dist.min.js", "1");
        touch(root, "README.md", "# hi\n");

        let config = Config::default();
        let walker = FileWalker::new(root, &config);
        let files = walker.walk().unwrap();
        let paths: Vec<_> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["README.md", "src/a.py", "src/b.py"]);

        let records = walker.records(&files);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, 0);
        assert_eq!(records[0].path, "src/a.py");
        assert_eq!(records[1].id, 1);
        assert_eq!(records[1].language, "python");
        assert_eq!(records[1].extension, ".py");
    }

    #[test]
    fn test_gitignore_respected() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        touch(root, ".gitignore", "generated/\n");
        touch(root, "generated/api.py", "pass\n");
        touch(root, "main.py", "pass\n");

        let config = Config::default();
        let files = FileWalker::new(root, &config).walk().unwrap();
        let paths: Vec<_> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["main.py"]);
    }

    #[test]
    fn test_limits() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        touch(root, "a.py", "pass\n");
        touch(root, "b.py", "pass\n");
        touch(root, "c.py", &"x".repeat(64));

        let mut config = Config::default();
        config.index.max_file_size = 32;
        let walker = FileWalker::new(root, &config);
        let files = walker.walk().unwrap();
        let records = walker.records(&files);
        assert_eq!(records.iter().map(|r| r.path.as_str()).collect::<Vec<_>>(), vec!["a.py", "b.py"]);

        config.index.max_files = 1;
        let walker = FileWalker::new(root, &config);
        assert_eq!(walker.records(&files).len(), 1);
    }

    #[test]
    fn test_missing_root() {
        let dir = tempdir().unwrap();
        let config = Config::default();
        let result = FileWalker::new(&dir.path().join("gone"), &config).walk();
        assert!(matches!(result, Err(Error::ProjectNotFound { .. })));
    }

    #[test]
    fn test_relative_path() {
        assert_eq!(
            relative_path(Path::new("/p"), Path::new("/p/src/a.py")).as_deref(),
            Some("src/a.py")
        );
        assert_eq!(relative_path(Path::new("/p"), Path::new("/q/a.py")), None);
    }
}
