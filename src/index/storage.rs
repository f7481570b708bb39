//! Index Persistence
//!
//! One JSON document per project. Writes go to a temporary sibling and are
//! renamed into place so readers never see a partial file.
//!
//! @module index/storage

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde_json::Value;
use tracing::{debug, info};

use super::schema::{self, SchemaVersion};
use super::types::CodeIndex;
use super::validate::{validate, validate_lookup_shapes};
use crate::core::error::{Error, Result};

/// Persisted index location for one project
#[derive(Debug, Clone)]
pub struct IndexStore {
    path: PathBuf,
}

impl IndexStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Modification time of the persisted document, if any
    pub fn modified(&self) -> Option<SystemTime> {
        fs::metadata(&self.path).and_then(|m| m.modified()).ok()
    }

    pub fn save(&self, index: &CodeIndex) -> Result<()> {
        save(index, &self.path)
    }

    pub fn load(&self) -> Result<CodeIndex> {
        load(&self.path)
    }

    /// Delete the persisted document. Missing is not an error.
    pub fn remove(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// =============================================================================
// SAVE
// =============================================================================

/// Write the index as JSON via a temp file and rename
pub fn save(index: &CodeIndex, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let bytes = serde_json::to_vec_pretty(index)?;
    let tmp = temp_sibling(path);
    fs::write(&tmp, &bytes)?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }

    info!(path = %path.display(), bytes = bytes.len(), files = index.files.len(), "Saved index");
    Ok(())
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(format!(".{}.tmp", std::process::id()));
    path.with_file_name(name)
}

// =============================================================================
// LOAD
// =============================================================================

/// Read, migrate and validate a persisted index.
///
/// Malformed lookup shapes are rejected before deserialization. The stored
/// validation report is replaced by a fresh one for the loaded document.
pub fn load(path: &Path) -> Result<CodeIndex> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::IndexNotFound {
                path: path.to_path_buf(),
            })
        }
        Err(e) => return Err(e.into()),
    };

    let mut doc: Value = serde_json::from_slice(&bytes)?;
    let original = schema::migrate(&mut doc)?;

    let shapes = validate_lookup_shapes(&doc);
    if !shapes.is_valid() {
        return Err(Error::IndexError {
            message: format!("Malformed index lookups: {}", shapes.errors.join("; ")),
        });
    }

    let mut index: CodeIndex = serde_json::from_value(doc)?;

    let mut report = validate(&index);
    if original != SchemaVersion::CURRENT {
        report
            .warnings
            .push(format!("Index upgraded from version {}", original));
    }
    index.index_metadata.validation = report;

    debug!(path = %path.display(), version = original.as_str(), files = index.files.len(), "Loaded index");
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::registry::tests::analysis;
    use crate::index::registry::SymbolRegistry;
    use serde_json::json;
    use tempfile::tempdir;

    fn sample() -> CodeIndex {
        let files = vec![
            analysis(0, "a.py", &["helper", "main"], &["App"]),
            analysis(1, "b.py", &["helper"], &[]),
        ];
        let mut index = CodeIndex::fallback("demo", "/work/demo", "");
        index.index_metadata.build_error = None;
        index.lookups = SymbolRegistry::build(&files).lookups();
        index.files = files;
        index
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let store = IndexStore::new(dir.path().join("nested").join("index.json"));
        assert!(!store.exists());
        assert!(store.modified().is_none());

        let index = sample();
        store.save(&index).unwrap();
        assert!(store.exists());

        let loaded = store.load().unwrap();
        assert_eq!(loaded.files, index.files);
        assert_eq!(loaded.lookups, index.lookups);
        assert!(loaded.index_metadata.validation.is_valid());

        // No temp files left behind
        let entries = fs::read_dir(dir.path().join("nested")).unwrap().count();
        assert_eq!(entries, 1);

        store.remove().unwrap();
        store.remove().unwrap();
        assert!(!store.exists());
    }

    #[test]
    fn test_missing_index() {
        let dir = tempdir().unwrap();
        let err = load(&dir.path().join("index.json")).unwrap_err();
        assert!(matches!(err, Error::IndexNotFound { .. }));
    }

    #[test]
    fn test_rejects_old_schema() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index.json");
        let mut doc = serde_json::to_value(sample()).unwrap();
        doc["index_metadata"]["version"] = json!("2.0");
        fs::write(&path, serde_json::to_vec(&doc).unwrap()).unwrap();

        let err = load(&path).unwrap_err();
        assert!(matches!(err, Error::UnsupportedSchema { .. }));
    }

    #[test]
    fn test_upgrades_v3_document() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index.json");
        let mut doc = serde_json::to_value(sample()).unwrap();
        doc["index_metadata"]["version"] = json!("3.0");
        doc["lookups"]["function_to_file_id"]["main"] = json!(0);
        fs::write(&path, serde_json::to_vec(&doc).unwrap()).unwrap();

        let index = load(&path).unwrap();
        assert!(index.index_metadata.version.is_current());
        assert_eq!(index.lookups.function_to_file_id["main"], vec![0]);
        assert!(index
            .index_metadata
            .validation
            .warnings
            .contains(&"Index upgraded from version 3.0".to_string()));
    }

    #[test]
    fn test_rejects_malformed_lookups() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index.json");
        let mut doc = serde_json::to_value(sample()).unwrap();
        doc["lookups"]["class_to_file_id"]["App"] = json!("zero");
        fs::write(&path, serde_json::to_vec(&doc).unwrap()).unwrap();

        let err = load(&path).unwrap_err();
        assert!(err.to_string().contains("Malformed index lookups"));
    }
}
