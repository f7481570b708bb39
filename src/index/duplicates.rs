//! Duplicate name detection and reporting
//!
//! @module index/duplicates

use std::collections::BTreeMap;

use serde::Serialize;

use super::qualified::parse_qualified_name;
use super::types::{CodeIndex, SymbolKind};

/// Name -> ids of every declaring file, for names declared more than once
pub type DuplicateMap = BTreeMap<String, Vec<u32>>;

pub fn detect_duplicate_functions(index: &CodeIndex) -> DuplicateMap {
    only_duplicates(&index.lookups.function_to_file_id)
}

pub fn detect_duplicate_classes(index: &CodeIndex) -> DuplicateMap {
    only_duplicates(&index.lookups.class_to_file_id)
}

fn only_duplicates(table: &BTreeMap<String, Vec<u32>>) -> DuplicateMap {
    table
        .iter()
        .filter(|(_, ids)| ids.len() > 1)
        .map(|(name, ids)| (name.clone(), ids.clone()))
        .collect()
}

// =============================================================================
// STATISTICS
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MostDuplicated {
    pub name: Option<String>,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DuplicateKindStats {
    /// Names declared in more than one file
    pub count: usize,
    /// Declarations across all duplicated names
    pub total_occurrences: usize,
    pub most_duplicated: MostDuplicated,
    pub names: Vec<String>,
}

impl DuplicateKindStats {
    fn from_map(duplicates: &DuplicateMap) -> Self {
        let mut most_duplicated = MostDuplicated::default();
        for (name, ids) in duplicates {
            // Strictly greater keeps the alphabetically first name on ties
            if ids.len() > most_duplicated.count {
                most_duplicated = MostDuplicated {
                    name: Some(name.clone()),
                    count: ids.len(),
                };
            }
        }
        Self {
            count: duplicates.len(),
            total_occurrences: duplicates.values().map(Vec::len).sum(),
            most_duplicated,
            names: duplicates.keys().cloned().collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DuplicateStatistics {
    pub function_duplicates: DuplicateKindStats,
    pub class_duplicates: DuplicateKindStats,
    pub total_unique_functions: usize,
    pub total_unique_classes: usize,
    /// Percentage of unique function names that are duplicated
    pub function_duplicate_percentage: f64,
    /// Percentage of unique class names that are duplicated
    pub class_duplicate_percentage: f64,
}

pub fn get_duplicate_statistics(index: &CodeIndex) -> DuplicateStatistics {
    let functions = detect_duplicate_functions(index);
    let classes = detect_duplicate_classes(index);
    let total_unique_functions = index.lookups.function_to_file_id.len();
    let total_unique_classes = index.lookups.class_to_file_id.len();

    DuplicateStatistics {
        function_duplicates: DuplicateKindStats::from_map(&functions),
        class_duplicates: DuplicateKindStats::from_map(&classes),
        total_unique_functions,
        total_unique_classes,
        function_duplicate_percentage: percentage(functions.len(), total_unique_functions),
        class_duplicate_percentage: percentage(classes.len(), total_unique_classes),
    }
}

fn percentage(part: usize, whole: usize) -> f64 {
    part as f64 / whole.max(1) as f64 * 100.0
}

/// Paths of every file declaring a function or class with this name
pub fn get_file_paths_for_duplicates(index: &CodeIndex, name: &str, kind: SymbolKind) -> Vec<String> {
    let table = match kind {
        SymbolKind::Function => &index.lookups.function_to_file_id,
        SymbolKind::Class => &index.lookups.class_to_file_id,
        SymbolKind::Import => return Vec::new(),
    };
    table
        .get(name)
        .map(|ids| {
            ids.iter()
                .map(|id| {
                    index
                        .file(*id)
                        .map(|f| f.file.path.clone())
                        .unwrap_or_else(|| format!("unknown_file_{}", id))
                })
                .collect()
        })
        .unwrap_or_default()
}

// =============================================================================
// RELATIONSHIPS
// =============================================================================

/// A qualified callee whose plain name also has caller entries
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrossFileCall {
    pub qualified_name: String,
    pub unqualified_name: String,
    pub qualified_callers: usize,
    pub total_callers: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DuplicateRelationships {
    pub cross_file_calls: Vec<CrossFileCall>,
}

/// Compare qualified and plain caller counts in `function_callers`
pub fn analyze_duplicate_relationships(index: &CodeIndex) -> DuplicateRelationships {
    let callers = &index.reverse_lookups.function_callers;
    let cross_file_calls = callers
        .iter()
        .filter_map(|(callee, entries)| {
            let (_, name) = parse_qualified_name(callee).ok()?;
            let plain = callers.get(&name)?;
            Some(CrossFileCall {
                qualified_name: callee.clone(),
                qualified_callers: entries.len(),
                total_callers: plain.len(),
                unqualified_name: name,
            })
        })
        .collect();

    DuplicateRelationships { cross_file_calls }
}

// =============================================================================
// REPORT
// =============================================================================

/// Human-readable duplicate report
pub fn format_duplicate_report(index: &CodeIndex) -> String {
    let stats = get_duplicate_statistics(index);
    let rule = "=".repeat(60);

    let mut lines = vec![
        rule.clone(),
        "DUPLICATE NAMES DETECTION REPORT".to_string(),
        rule.clone(),
        String::new(),
        "SUMMARY:".to_string(),
        format!("  Total unique functions: {}", stats.total_unique_functions),
        format!(
            "  Functions with duplicates: {} ({:.1}%)",
            stats.function_duplicates.count, stats.function_duplicate_percentage
        ),
        format!("  Total unique classes: {}", stats.total_unique_classes),
        format!(
            "  Classes with duplicates: {} ({:.1}%)",
            stats.class_duplicates.count, stats.class_duplicate_percentage
        ),
        String::new(),
    ];

    for (heading, duplicates, kind) in [
        ("DUPLICATE FUNCTIONS:", detect_duplicate_functions(index), SymbolKind::Function),
        ("DUPLICATE CLASSES:", detect_duplicate_classes(index), SymbolKind::Class),
    ] {
        if duplicates.is_empty() {
            continue;
        }
        lines.push(heading.to_string());
        for (name, ids) in &duplicates {
            lines.push(format!("  {} ({} occurrences):", name, ids.len()));
            lines.extend(
                get_file_paths_for_duplicates(index, name, kind)
                    .into_iter()
                    .map(|path| format!("    - {}", path)),
            );
        }
        lines.push(String::new());
    }

    if stats.function_duplicates.most_duplicated.name.is_some() {
        lines.push("MOST DUPLICATED:".to_string());
    }
    for (label, most) in [
        ("Function", &stats.function_duplicates.most_duplicated),
        ("Class", &stats.class_duplicates.most_duplicated),
    ] {
        if let Some(name) = &most.name {
            lines.push(format!("  {}: {} ({} occurrences)", label, name, most.count));
        }
    }

    lines.push(String::new());
    lines.push(rule);
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::registry::tests::analysis;
    use crate::index::registry::SymbolRegistry;
    use crate::index::types::{CallerRef, FileAnalysis};

    fn index_of(files: Vec<FileAnalysis>) -> CodeIndex {
        let mut index = CodeIndex::fallback("p", "/p", "");
        index.lookups = SymbolRegistry::build(&files).lookups();
        index.files = files;
        index
    }

    fn sample() -> CodeIndex {
        index_of(vec![
            analysis(0, "a.py", &["helper", "main"], &["Config"]),
            analysis(1, "b.py", &["helper"], &["Config"]),
            analysis(2, "c.py", &["helper", "run"], &[]),
        ])
    }

    #[test]
    fn test_detection_and_stats() {
        let index = sample();
        let functions = detect_duplicate_functions(&index);
        assert_eq!(functions.len(), 1);
        assert_eq!(functions["helper"], vec![0, 1, 2]);
        assert_eq!(detect_duplicate_classes(&index)["Config"], vec![0, 1]);

        let stats = get_duplicate_statistics(&index);
        assert_eq!(stats.total_unique_functions, 3);
        assert_eq!(stats.function_duplicates.count, 1);
        assert_eq!(stats.function_duplicates.total_occurrences, 3);
        assert_eq!(stats.function_duplicates.most_duplicated.name.as_deref(), Some("helper"));
        assert!((stats.function_duplicate_percentage - 100.0 / 3.0).abs() < 1e-9);
        assert!((stats.class_duplicate_percentage - 100.0).abs() < 1e-9);

        assert_eq!(
            get_file_paths_for_duplicates(&index, "helper", SymbolKind::Function),
            vec!["a.py", "b.py", "c.py"]
        );
        assert!(get_file_paths_for_duplicates(&index, "nope", SymbolKind::Class).is_empty());
    }

    #[test]
    fn test_relationships() {
        let mut index = sample();
        let caller = |id: u32, path: &str| CallerRef {
            file_id: id,
            caller: "main".to_string(),
            caller_qualified: format!("{}:main", path),
            caller_file_path: path.to_string(),
        };
        let callers = &mut index.reverse_lookups.function_callers;
        callers.insert("b.py:helper".to_string(), vec![caller(0, "a.py")]);
        callers.insert("c.py:helper".to_string(), vec![caller(0, "a.py")]);
        callers.insert("helper".to_string(), vec![caller(0, "a.py"), caller(2, "c.py")]);

        let analysis = analyze_duplicate_relationships(&index);
        assert_eq!(analysis.cross_file_calls.len(), 2);
        assert_eq!(analysis.cross_file_calls[0].qualified_name, "b.py:helper");
        assert_eq!(analysis.cross_file_calls[0].unqualified_name, "helper");
        assert_eq!(analysis.cross_file_calls[0].qualified_callers, 1);
        assert_eq!(analysis.cross_file_calls[0].total_callers, 2);
    }

    #[test]
    fn test_report() {
        let report = format_duplicate_report(&sample());
        let expected = "\
============================================================
DUPLICATE NAMES DETECTION REPORT
============================================================

SUMMARY:
  Total unique functions: 3
  Functions with duplicates: 1 (33.3%)
  Total unique classes: 1
  Classes with duplicates: 1 (100.0%)

DUPLICATE FUNCTIONS:
  helper (3 occurrences):
    - a.py
    - b.py
    - c.py

DUPLICATE CLASSES:
  Config (2 occurrences):
    - a.py
    - b.py

MOST DUPLICATED:
  Function: helper (3 occurrences)
  Class: Config (2 occurrences)

============================================================";
        assert_eq!(report, expected);
    }
}
