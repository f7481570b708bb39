//! Index queries
//!
//! Read-only views over an assembled index: per-file symbols, symbol search
//! and summary statistics.
//!
//! @module index/query

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use super::duplicates::{detect_duplicate_classes, detect_duplicate_functions};
use super::qualified::{generate_qualified_name, normalize_path};
use super::types::{ClassSymbol, CodeIndex, FunctionSymbol, ImportRecord, SymbolKind};

// =============================================================================
// FILE SYMBOLS
// =============================================================================

/// Declarations of a single file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileSymbols {
    pub path: String,
    pub language: String,
    pub functions: Vec<FunctionSymbol>,
    pub classes: Vec<ClassSymbol>,
    pub imports: Vec<ImportRecord>,
}

/// Symbols declared in a file, by project-relative path in any separator style
pub fn find_symbols_in_file(index: &CodeIndex, path: &str) -> Option<FileSymbols> {
    let file = index.file_by_path(&normalize_path(path))?;
    Some(FileSymbols {
        path: file.file.path.clone(),
        language: file.file.language.clone(),
        functions: file.functions.clone(),
        classes: file.classes.clone(),
        imports: file.imports.clone(),
    })
}

// =============================================================================
// SEARCH
// =============================================================================

/// One search hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SymbolMatch {
    pub name: String,
    pub qualified_name: String,
    pub kind: SymbolKind,
    pub file_path: String,
    pub file_id: u32,
    pub line_start: u32,
    pub line_end: u32,
}

/// Case-insensitive substring search over symbol names.
///
/// Exact (case-insensitive) matches come first; within each group results
/// are ordered by qualified name.
pub fn search_symbols(index: &CodeIndex, query: &str, kind: Option<SymbolKind>) -> Vec<SymbolMatch> {
    let needle = query.to_lowercase();
    let wants = |k: SymbolKind| kind.map_or(true, |wanted| wanted == k);
    let mut matches = Vec::new();

    for file in &index.files {
        let path = &file.file.path;
        let mut push = |name: &str, kind: SymbolKind, line_start: u32, line_end: u32| {
            if name.to_lowercase().contains(&needle) {
                matches.push(SymbolMatch {
                    name: name.to_string(),
                    qualified_name: generate_qualified_name(path, name),
                    kind,
                    file_path: path.clone(),
                    file_id: file.file.id,
                    line_start,
                    line_end,
                });
            }
        };

        if wants(SymbolKind::Function) {
            for f in &file.functions {
                push(&f.name, SymbolKind::Function, f.line_start, f.line_end);
            }
        }
        if wants(SymbolKind::Class) {
            for c in &file.classes {
                push(&c.name, SymbolKind::Class, c.line_start, c.line_end);
            }
        }
        if wants(SymbolKind::Import) {
            for i in &file.imports {
                push(&i.module, SymbolKind::Import, i.line_number, i.line_number);
            }
        }
    }

    matches.sort_by(|a, b| {
        let exact_a = a.name.to_lowercase() != needle;
        let exact_b = b.name.to_lowercase() != needle;
        exact_a
            .cmp(&exact_b)
            .then_with(|| a.qualified_name.cmp(&b.qualified_name))
            .then_with(|| a.line_start.cmp(&b.line_start))
    });
    matches
}

// =============================================================================
// STATISTICS
// =============================================================================

/// Summary counts for an index
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub file_count: usize,
    pub symbol_counts_by_kind: BTreeMap<SymbolKind, usize>,
    /// Language -> file count
    pub languages: BTreeMap<String, usize>,
    /// Kind -> number of names declared in more than one file
    pub duplicate_counts: BTreeMap<SymbolKind, usize>,
}

pub fn get_stats(index: &CodeIndex) -> IndexStats {
    let mut stats = IndexStats {
        file_count: index.files.len(),
        ..Default::default()
    };

    for file in &index.files {
        *stats.languages.entry(file.file.language.clone()).or_default() += 1;
        *stats.symbol_counts_by_kind.entry(SymbolKind::Function).or_default() += file.functions.len();
        *stats.symbol_counts_by_kind.entry(SymbolKind::Class).or_default() += file.classes.len();
        *stats.symbol_counts_by_kind.entry(SymbolKind::Import).or_default() += file.imports.len();
    }

    stats
        .duplicate_counts
        .insert(SymbolKind::Function, detect_duplicate_functions(index).len());
    stats
        .duplicate_counts
        .insert(SymbolKind::Class, detect_duplicate_classes(index).len());

    stats
}

impl fmt::Display for IndexStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Files: {}", self.file_count)?;
        for (kind, count) in &self.symbol_counts_by_kind {
            let duplicates = self.duplicate_counts.get(kind).copied().unwrap_or(0);
            if duplicates > 0 {
                writeln!(f, "{}: {} ({} duplicated names)", plural(*kind), count, duplicates)?;
            } else {
                writeln!(f, "{}: {}", plural(*kind), count)?;
            }
        }
        let languages: Vec<String> = self
            .languages
            .iter()
            .map(|(lang, n)| format!("{} ({})", lang, n))
            .collect();
        write!(f, "Languages: {}", languages.join(", "))
    }
}

fn plural(kind: SymbolKind) -> &'static str {
    match kind {
        SymbolKind::Function => "Functions",
        SymbolKind::Class => "Classes",
        SymbolKind::Import => "Imports",
    }
}
