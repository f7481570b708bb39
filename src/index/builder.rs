//! Code Index Builder
//!
//! The full pipeline: discover, analyze each file (in parallel above a
//! small threshold), then a single-threaded fold that registers symbols,
//! resolves relationships, assembles and validates.
//!
//! @module index/builder

use std::fmt;
use std::path::Path;
use std::time::Instant;

use rayon::prelude::*;
use tracing::{info, warn};

use super::assemble::assemble;
use super::registry::SymbolRegistry;
use super::resolver::resolve;
use super::types::{CodeIndex, FileAnalysis, FileRecord};
use super::validate::{log_report, validate};
use crate::core::config::Config;
use crate::core::project::project_name;
use crate::scan::{scan_project, ContentSource, FsContentSource};
use crate::strategy::{analyze_file, StrategyRegistry};

// =============================================================================
// BUILD
// =============================================================================

/// Build a complete index for a project root.
///
/// Never fails. A scan failure yields an empty index with
/// `index_metadata.build_error` set; per-file failures are recorded on the
/// file entries.
pub fn build_index(root: &Path, config: &Config, strategies: &StrategyRegistry) -> CodeIndex {
    let started = Instant::now();
    info!(root = %root.display(), "Building code index");

    let scan = match scan_project(root, config) {
        Ok(scan) => scan,
        Err(e) => {
            warn!(root = %root.display(), error = %e, "Scan failed, returning empty index");
            return CodeIndex::fallback(
                &project_name(root),
                &root.to_string_lossy(),
                e.to_string(),
            );
        }
    };

    let source = FsContentSource::new(root);
    let mut files = analyze_all(&scan.files, config, strategies, &source);

    let registry = SymbolRegistry::build(&files);
    let resolution = resolve(&mut files, &registry, &source);

    let mut index = assemble(root, scan, files, &registry, resolution);
    index.index_metadata.analysis_time_ms = started.elapsed().as_millis() as u64;

    let report = validate(&index);
    log_report(&report);
    index.index_metadata.validation = report;

    info!(stats = %BuildStats::of(&index), "Code index built");
    index
}

/// Analyze every file, preserving input order
fn analyze_all(
    files: &[FileRecord],
    config: &Config,
    strategies: &StrategyRegistry,
    source: &dyn ContentSource,
) -> Vec<FileAnalysis> {
    let analyze = |file: &FileRecord| {
        // Unreadable files are analyzed as empty
        let content = source.read(&file.path).unwrap_or_default();
        analyze_file(strategies, file, &content)
    };

    if files.len() <= config.index.parallel_threshold {
        info!(files = files.len(), "Analyzing files sequentially");
        return files.iter().map(analyze).collect();
    }

    let workers = config
        .index
        .max_workers
        .filter(|n| *n > 0)
        .unwrap_or_else(rayon::current_num_threads);

    match rayon::ThreadPoolBuilder::new().num_threads(workers).build() {
        Ok(pool) => {
            info!(files = files.len(), workers, "Analyzing files in parallel");
            pool.install(|| files.par_iter().map(analyze).collect())
        }
        Err(e) => {
            warn!(error = %e, "Could not start worker pool, analyzing sequentially");
            files.iter().map(analyze).collect()
        }
    }
}

// =============================================================================
// STATS
// =============================================================================

/// Summary of a finished build
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    pub files: usize,
    pub functions: usize,
    pub classes: usize,
    pub files_with_errors: usize,
    pub elapsed_ms: u64,
}

impl BuildStats {
    pub fn of(index: &CodeIndex) -> Self {
        Self {
            files: index.files.len(),
            functions: index.files.iter().map(|f| f.functions.len()).sum(),
            classes: index.files.iter().map(|f| f.classes.len()).sum(),
            files_with_errors: index.index_metadata.files_with_errors.len(),
            elapsed_ms: index.index_metadata.analysis_time_ms,
        }
    }
}

impl fmt::Display for BuildStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} files, {} functions, {} classes, {} with errors in {}ms",
            self.files, self.functions, self.classes, self.files_with_errors, self.elapsed_ms
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::duplicates::format_duplicate_report;
    use crate::index::qualified::parse_qualified_name;
    use std::collections::BTreeSet;
    use std::fs;
    use tempfile::tempdir;

    fn build(root: &Path) -> CodeIndex {
        build_index(root, &Config::default(), &StrategyRegistry::default())
    }

    fn write(root: &Path, path: &str, content: &str) {
        let full = root.join(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(full, content).unwrap();
    }

    #[test]
    fn test_cross_file_call() {
        let dir = tempdir().unwrap();
        write(dir.path(), "a.py", "def foo():\n    bar()\n");
        write(dir.path(), "b.py", "def bar():\n    pass\n");

        let index = build(dir.path());
        assert!(index.build_error().is_none());

        let b = index.file_by_path("b.py").unwrap();
        assert!(b.functions[0].called_by.contains(&"a.py:foo".to_string()));

        let callers = &index.reverse_lookups.function_callers["b.py:bar"];
        assert_eq!(callers.len(), 1);
        assert_eq!(callers[0].caller, "foo");
        assert_eq!(callers[0].caller_file_path, "a.py");

        let a = index.file_by_path("a.py").unwrap();
        assert!(a.functions[0].calls.contains(&"b.py:bar".to_string()));
        assert!(index.index_metadata.validation.is_valid());
    }

    #[test]
    fn test_duplicate_helper() {
        let dir = tempdir().unwrap();
        write(dir.path(), "one.py", "def helper():\n    pass\n");
        write(dir.path(), "two.py", "def helper():\n    pass\n");

        let index = build(dir.path());
        assert_eq!(index.lookups.function_to_file_id["helper"].len(), 2);
        assert!(format_duplicate_report(&index).contains("helper (2 occurrences)"));
    }

    #[test]
    fn test_syntax_error_file_is_kept() {
        let dir = tempdir().unwrap();
        write(dir.path(), "ok.py", "def fine():\n    return 1\n");
        write(dir.path(), "broken.py", "def broken(\n    return 1\n");

        let index = build(dir.path());
        assert_eq!(index.files.len(), 2);

        let broken = index.file_by_path("broken.py").unwrap();
        assert!(broken.functions.is_empty());
        assert!(broken.classes.is_empty());
        assert!(broken.has_errors());
        assert_eq!(index.index_metadata.files_with_errors, vec!["broken.py"]);
    }

    #[test]
    fn test_referential_closure() {
        let dir = tempdir().unwrap();
        write(dir.path(), "src/app.py", "import os\n\nclass App:\n    pass\n\ndef run():\n    App()\n    util()\n");
        write(dir.path(), "src/util.py", "def util():\n    return 1\n");
        write(dir.path(), "web/main.js", "function util() {}\nfunction start() {\n  util();\n}\n");

        let index = build(dir.path());
        let ids: BTreeSet<u32> = index.files.iter().map(|f| f.file.id).collect();
        let paths: BTreeSet<&str> = index.files.iter().map(|f| f.file.path.as_str()).collect();

        for id in index.lookups.path_to_id.values() {
            assert!(ids.contains(id));
        }
        for list in index
            .lookups
            .function_to_file_id
            .values()
            .chain(index.lookups.class_to_file_id.values())
        {
            assert!(!list.is_empty());
            assert!(list.iter().all(|id| ids.contains(id)));
        }
        for callers in index
            .reverse_lookups
            .function_callers
            .values()
            .chain(index.reverse_lookups.class_instantiators.values())
        {
            for caller in callers {
                assert!(ids.contains(&caller.file_id));
                assert!(paths.contains(caller.caller_file_path.as_str()));
            }
        }
        for file in &index.files {
            for qualified in file.functions.iter().flat_map(|f| f.calls.iter().chain(&f.called_by)) {
                if let Ok((path, _)) = parse_qualified_name(qualified) {
                    assert!(paths.contains(path.as_str()), "{}", qualified);
                }
            }
        }

        let app = index.file_by_path("src/app.py").unwrap();
        assert!(app.classes[0].instantiated_by.contains(&"src/app.py:run".to_string()));
        assert!(index.reverse_lookups.imports_module.contains_key("os"));
        assert!(index.index_metadata.validation.is_valid(), "{:?}", index.index_metadata.validation);
    }

    #[test]
    fn test_isolation_of_failing_file() {
        let dir = tempdir().unwrap();
        write(dir.path(), "good.py", "def good():\n    helper()\n\ndef helper():\n    pass\n");
        fs::write(dir.path().join("bad.py"), [0x64, 0x65, 0x66, 0x20, 0xff, 0xfe, 0x28]).unwrap();

        let index = build(dir.path());
        let good = index.file_by_path("good.py").unwrap();
        assert_eq!(good.functions.len(), 2);
        assert!(good.functions[0].calls.contains(&"good.py:helper".to_string()));
        assert!(index.file_by_path("bad.py").is_some());
    }

    #[test]
    fn test_parallel_build_is_deterministic() {
        let dir = tempdir().unwrap();
        for i in 0..8 {
            write(
                dir.path(),
                &format!("pkg/mod{}.py", i),
                &format!("def f{}():\n    shared()\n\ndef shared():\n    pass\n", i),
            );
        }

        let first = build(dir.path());
        let second = build(dir.path());
        assert_eq!(first.files.len(), 8);
        assert_eq!(first.files, second.files);
        assert_eq!(first.lookups, second.lookups);
        assert_eq!(first.reverse_lookups, second.reverse_lookups);
        assert_eq!(first.lookups.function_to_file_id["shared"], (0..8).collect::<Vec<u32>>());

        let mut config = Config::default();
        config.index.max_workers = Some(1);
        let single = build_index(dir.path(), &config, &StrategyRegistry::default());
        assert_eq!(single.files, first.files);
    }

    #[test]
    fn test_missing_root_falls_back() {
        let dir = tempdir().unwrap();
        let index = build(&dir.path().join("missing"));
        assert!(index.files.is_empty());
        assert!(index.build_error().is_some());
        assert_eq!(index.project_metadata.name, "missing");
    }

    #[test]
    fn test_metadata() {
        let dir = tempdir().unwrap();
        write(dir.path(), "main.py", "def main():\n    pass\n");
        write(dir.path(), "README.md", "# demo\n");

        let index = build(dir.path());
        assert_eq!(index.project_metadata.total_files, 1);
        assert_eq!(index.project_metadata.total_lines, 2);
        assert_eq!(index.index_metadata.languages_analyzed, vec!["python"]);
        assert!(index.special_files.entry_points.contains(&"main.py".to_string()));
        assert!(index.special_files.documentation.contains(&"README.md".to_string()));
        assert!(index.directory_tree.contains_key("main.py"));
        assert_eq!(BuildStats::of(&index).functions, 1);
    }
}
