//! Index Assembler
//!
//! @module index/assemble

use std::path::Path;

use chrono::Utc;

use super::registry::SymbolRegistry;
use super::resolver::Resolution;
use super::types::{CodeIndex, FileAnalysis, IndexMetadata, ProjectMetadata};
use crate::core::project::project_name;
use crate::scan::ScanResult;

/// Merge scan metadata, per-file results and the relationship graph
pub fn assemble(
    root: &Path,
    scan: ScanResult,
    files: Vec<FileAnalysis>,
    registry: &SymbolRegistry,
    resolution: Resolution,
) -> CodeIndex {
    let total_lines = files.iter().map(|f| u64::from(f.line_count)).sum();

    let files_with_errors = files
        .iter()
        .filter(|f| f.has_errors())
        .map(|f| f.file.path.clone())
        .collect();

    let mut languages_analyzed: Vec<String> = files.iter().map(|f| f.file.language.clone()).collect();
    languages_analyzed.sort_unstable();
    languages_analyzed.dedup();

    CodeIndex {
        project_metadata: ProjectMetadata {
            name: project_name(root),
            root_path: root.to_string_lossy().to_string(),
            indexed_at: Utc::now(),
            total_files: files.len(),
            total_lines,
        },
        directory_tree: scan.directory_tree,
        lookups: registry.lookups(),
        reverse_lookups: resolution.reverse_lookups,
        special_files: scan.special_files,
        index_metadata: IndexMetadata {
            files_with_errors,
            languages_analyzed,
            ..Default::default()
        },
        files,
    }
}
