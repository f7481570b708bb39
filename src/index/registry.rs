//! Symbol Registry
//!
//! Global name tables built from per-file analysis. Each kind maps a name
//! to every declaring file in ascending id order (the duplicate-safe view
//! the resolver and lookups use). The head of that list is the first
//! declaring file, which is what single-id consumers expect.
//!
//! @module index/registry

use std::collections::BTreeMap;

use tracing::debug;

use super::types::{FileAnalysis, Lookups};

#[derive(Debug, Clone, Default)]
pub struct SymbolRegistry {
    path_to_id: BTreeMap<String, u32>,
    function_files: BTreeMap<String, Vec<u32>>,
    class_files: BTreeMap<String, Vec<u32>>,
}

impl SymbolRegistry {
    /// Build the tables from analysis results in file id order
    pub fn build(files: &[FileAnalysis]) -> Self {
        let mut registry = Self::default();

        for analysis in files {
            let id = analysis.file.id;
            registry.path_to_id.insert(analysis.file.path.clone(), id);

            for func in &analysis.functions {
                push_unique(registry.function_files.entry(func.name.clone()).or_default(), id);
            }
            for class in &analysis.classes {
                push_unique(registry.class_files.entry(class.name.clone()).or_default(), id);
            }
        }

        debug!(
            functions = registry.function_files.len(),
            classes = registry.class_files.len(),
            duplicate_functions = registry.duplicate_functions().count(),
            duplicate_classes = registry.duplicate_classes().count(),
            "Built symbol registry"
        );

        registry
    }

    /// Every file declaring a function with this name
    pub fn function_files(&self, name: &str) -> &[u32] {
        self.function_files.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every file declaring a class with this name
    pub fn class_files(&self, name: &str) -> &[u32] {
        self.class_files.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// First file declaring a function with this name
    pub fn first_function_file(&self, name: &str) -> Option<u32> {
        self.function_files(name).first().copied()
    }

    /// First file declaring a class with this name
    pub fn first_class_file(&self, name: &str) -> Option<u32> {
        self.class_files(name).first().copied()
    }

    /// Function names declared in more than one file
    pub fn duplicate_functions(&self) -> impl Iterator<Item = (&str, &[u32])> {
        duplicates(&self.function_files)
    }

    /// Class names declared in more than one file
    pub fn duplicate_classes(&self) -> impl Iterator<Item = (&str, &[u32])> {
        duplicates(&self.class_files)
    }

    /// Forward lookup tables for the index
    pub fn lookups(&self) -> Lookups {
        Lookups {
            path_to_id: self.path_to_id.clone(),
            function_to_file_id: self.function_files.clone(),
            class_to_file_id: self.class_files.clone(),
        }
    }
}

fn push_unique(ids: &mut Vec<u32>, id: u32) {
    if !ids.contains(&id) {
        ids.push(id);
    }
}

fn duplicates(table: &BTreeMap<String, Vec<u32>>) -> impl Iterator<Item = (&str, &[u32])> {
    table
        .iter()
        .filter(|(_, ids)| ids.len() > 1)
        .map(|(name, ids)| (name.as_str(), ids.as_slice()))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::index::types::{ClassSymbol, FileRecord, FunctionSymbol};
    use chrono::Utc;

    /// Analysis fixture with named functions and classes
    pub(crate) fn analysis(id: u32, path: &str, functions: &[&str], classes: &[&str]) -> FileAnalysis {
        let mut analysis = FileAnalysis::new(FileRecord {
            id,
            path: path.to_string(),
            size: 0,
            modified_time: Utc::now(),
            extension: ".py".to_string(),
            language: "python".to_string(),
        });
        analysis.functions = functions
            .iter()
            .enumerate()
            .map(|(i, name)| FunctionSymbol::new(*name, i as u32 * 3 + 1, i as u32 * 3 + 2))
            .collect();
        analysis.classes = classes.iter().map(|name| ClassSymbol::new(*name, 1, 1)).collect();
        analysis
    }

    #[test]
    fn test_duplicate_views() {
        let files = vec![
            analysis(0, "a.py", &["helper", "main"], &["App"]),
            analysis(1, "b.py", &["helper", "helper"], &[]),
            analysis(2, "c.py", &["helper"], &["App"]),
        ];
        let registry = SymbolRegistry::build(&files);

        assert_eq!(registry.function_files("helper"), &[0, 1, 2]);
        assert_eq!(registry.first_function_file("helper"), Some(0));
        assert_eq!(registry.function_files("main"), &[0]);
        assert_eq!(registry.class_files("App"), &[0, 2]);
        assert_eq!(registry.first_class_file("App"), Some(0));
        assert!(registry.function_files("missing").is_empty());
        assert_eq!(registry.first_function_file("missing"), None);

        let dups: Vec<_> = registry.duplicate_functions().map(|(n, _)| n).collect();
        assert_eq!(dups, vec!["helper"]);
    }

    #[test]
    fn test_lookups() {
        let files = vec![analysis(0, "src/a.py", &["f"], &[]), analysis(1, "src/b.py", &[], &["K"])];
        let lookups = SymbolRegistry::build(&files).lookups();
        assert_eq!(lookups.path_to_id.get("src/b.py"), Some(&1));
        assert_eq!(lookups.function_to_file_id.get("f"), Some(&vec![0]));
        assert_eq!(lookups.class_to_file_id.get("K"), Some(&vec![1]));
    }
}
