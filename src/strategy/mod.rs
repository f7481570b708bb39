//! Parsing Strategies
//!
//! One strategy per language behind a single contract: given file content,
//! return declared functions, classes, imports and language-specific data.
//! Structured strategies walk a tree-sitter syntax tree; heuristic ones run
//! regex patterns. Anything unmapped goes to the generic strategy, which is
//! also the retry path when a primary strategy fails outright.
//!
//! @module strategy

pub mod c_family;
pub mod generic;
pub mod go;
pub mod heuristic;
pub mod java;
pub mod javascript;
pub mod python;
pub mod rust;
pub mod treesitter;

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::core::config::normalize_extension;
use crate::index::types::{ClassSymbol, FileAnalysis, FileRecord, FunctionSymbol, ImportRecord};

pub use generic::GenericStrategy;

// =============================================================================
// EXTRACTION ERROR
// =============================================================================

/// Errors that can occur during extraction
#[derive(Debug, Clone)]
pub enum ExtractError {
    /// Tree-sitter parsing failed
    ParseFailed { language: String, message: String },
    /// Language not supported by tree-sitter
    UnsupportedLanguage { language: String },
    /// A single extraction step failed
    StepFailed { step: &'static str, message: String },
}

impl std::fmt::Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ParseFailed { language, message } => {
                write!(f, "Failed to parse {} code: {}", language, message)
            }
            Self::UnsupportedLanguage { language } => {
                write!(f, "Language '{}' not supported by tree-sitter", language)
            }
            Self::StepFailed { step, message } => {
                write!(f, "{} step failed: {}", step, message)
            }
        }
    }
}

impl std::error::Error for ExtractError {}

// =============================================================================
// STRATEGY CONTRACT
// =============================================================================

/// A pluggable per-language symbol extractor
pub trait ParsingStrategy: Send + Sync {
    /// Language tag, e.g. `python`
    fn language(&self) -> &'static str;

    /// Extensions (lowercase, leading dot) this strategy claims
    fn extensions(&self) -> &'static [&'static str];

    /// Analyze one file. `Err` means the strategy could not run at all and
    /// the caller should retry with the generic strategy.
    fn analyze(&self, content: &str, file: &FileRecord) -> Result<FileAnalysis, ExtractError>;
}

/// The four independently-failing extraction steps of a strategy.
///
/// Implementors get `analyze` for free through [`run_steps`].
pub trait StepExtractor {
    type Source<'a>;

    fn functions(&self, source: &Self::Source<'_>) -> Result<Vec<FunctionSymbol>, ExtractError>;
    fn classes(&self, source: &Self::Source<'_>) -> Result<Vec<ClassSymbol>, ExtractError>;
    fn imports(&self, source: &Self::Source<'_>) -> Result<Vec<ImportRecord>, ExtractError>;
    fn language_specific(&self, source: &Self::Source<'_>) -> Result<Value, ExtractError>;
}

/// Run every step of an extractor, recording each failure without letting it
/// block the others.
pub fn run_steps<E: StepExtractor>(
    extractor: &E,
    source: &E::Source<'_>,
    language: &str,
    file: &FileRecord,
) -> FileAnalysis {
    let mut analysis = FileAnalysis::new(file.clone());
    let errors = &mut analysis.analysis_errors;

    analysis.functions = isolate("Function", extractor.functions(source), errors);
    analysis.classes = isolate("Class", extractor.classes(source), errors);
    analysis.imports = isolate("Import", extractor.imports(source), errors);

    let specific = isolate(
        "Language-specific",
        extractor.language_specific(source).map(Some),
        errors,
    );
    if let Some(value) = specific.filter(|v| !v.is_null()) {
        analysis
            .language_specific
            .insert(language.to_string(), value);
    }

    analysis
}

/// Unwrap a step result, turning a failure into an annotation
fn isolate<T: Default>(step: &str, result: Result<T, ExtractError>, errors: &mut Vec<String>) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            errors.push(format!("{} extraction failed: {}", step, e));
            T::default()
        }
    }
}

// =============================================================================
// STRATEGY REGISTRY
// =============================================================================

/// Extension -> strategy table with a single generic fallback
#[derive(Clone)]
pub struct StrategyRegistry {
    by_extension: HashMap<String, Arc<dyn ParsingStrategy>>,
    fallback: Arc<GenericStrategy>,
}

impl StrategyRegistry {
    /// Registry with only the generic fallback
    pub fn empty() -> Self {
        Self {
            by_extension: HashMap::new(),
            fallback: Arc::new(GenericStrategy),
        }
    }

    /// Register a strategy for every extension it claims, replacing earlier ones
    pub fn register(&mut self, strategy: Arc<dyn ParsingStrategy>) {
        for ext in strategy.extensions() {
            self.by_extension
                .insert(normalize_extension(ext), Arc::clone(&strategy));
        }
    }

    /// Strategy for an extension; the generic strategy when unmapped
    pub fn select(&self, extension: &str) -> &dyn ParsingStrategy {
        match self.by_extension.get(&normalize_extension(extension)) {
            Some(strategy) => strategy.as_ref(),
            None => self.fallback.as_ref(),
        }
    }

    /// Whether an extension has a dedicated strategy
    pub fn has_dedicated(&self, extension: &str) -> bool {
        self.by_extension
            .contains_key(&normalize_extension(extension))
    }

    pub fn fallback(&self) -> &GenericStrategy {
        &self.fallback
    }

    /// Languages with a dedicated strategy, sorted
    pub fn languages(&self) -> Vec<&'static str> {
        let mut langs: Vec<_> = self.by_extension.values().map(|s| s.language()).collect();
        langs.sort_unstable();
        langs.dedup();
        langs
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(python::PythonStrategy));
        registry.register(Arc::new(javascript::JavaScriptStrategy::javascript()));
        registry.register(Arc::new(javascript::JavaScriptStrategy::typescript()));
        registry.register(Arc::new(javascript::JavaScriptStrategy::tsx()));
        registry.register(Arc::new(go::GoStrategy));
        registry.register(Arc::new(rust::RustStrategy));
        registry.register(Arc::new(java::JavaStrategy));
        registry.register(Arc::new(c_family::CFamilyStrategy::c()));
        registry.register(Arc::new(c_family::CFamilyStrategy::cpp()));
        registry.register(Arc::new(c_family::CFamilyStrategy::csharp()));
        registry.register(Arc::new(c_family::CFamilyStrategy::objective_c()));
        registry
    }
}

impl std::fmt::Debug for StrategyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategyRegistry")
            .field("languages", &self.languages())
            .finish()
    }
}

// =============================================================================
// MAIN ANALYSIS FUNCTION
// =============================================================================

/// Analyze one file with its strategy, retrying once through the generic
/// strategy when the primary cannot run. Never fails: the worst case is an
/// empty result carrying the error strings.
pub fn analyze_file(registry: &StrategyRegistry, file: &FileRecord, content: &str) -> FileAnalysis {
    let line_count = count_lines(content);
    let strategy = registry.select(&file.extension);

    let mut analysis = match strategy.analyze(content, file) {
        Ok(analysis) => analysis,
        Err(primary) if registry.has_dedicated(&file.extension) => {
            warn!(
                file = %file.path,
                strategy = strategy.language(),
                error = %primary,
                "Strategy failed, falling back to generic"
            );
            let note = format!(
                "Primary strategy ({}) failed: {}, fell back to generic strategy",
                strategy.language(),
                primary
            );
            match registry.fallback().analyze(content, file) {
                Ok(mut analysis) => {
                    analysis.analysis_errors.insert(0, note);
                    analysis
                }
                Err(generic) => FileAnalysis::failed(
                    file.clone(),
                    vec![note, format!("Generic strategy failed: {}", generic)],
                ),
            }
        }
        Err(e) => FileAnalysis::failed(
            file.clone(),
            vec![format!("Generic strategy failed: {}", e)],
        ),
    };

    analysis.line_count = line_count;

    debug!(
        file = %file.path,
        functions = analysis.functions.len(),
        classes = analysis.classes.len(),
        imports = analysis.imports.len(),
        errors = analysis.analysis_errors.len(),
        "Analyzed"
    );

    analysis
}

/// Number of lines as an editor would show them
pub fn count_lines(content: &str) -> u32 {
    content.lines().count() as u32
}

// =============================================================================
// LANGUAGE DETECTION
// =============================================================================

/// Language tag for an extension (with or without leading dot)
pub fn detect_language(extension: &str) -> &'static str {
    match normalize_extension(extension).as_str() {
        ".py" | ".pyw" | ".pyi" => "python",
        ".js" | ".jsx" | ".mjs" | ".cjs" => "javascript",
        ".ts" | ".tsx" | ".mts" | ".cts" => "typescript",
        ".java" => "java",
        ".go" => "go",
        ".c" | ".h" => "c",
        ".cpp" | ".cxx" | ".cc" | ".hpp" | ".hxx" | ".hh" => "cpp",
        ".cs" => "csharp",
        ".m" | ".mm" => "objective-c",
        ".rb" => "ruby",
        ".php" => "php",
        ".swift" => "swift",
        ".kt" | ".kts" => "kotlin",
        ".rs" => "rust",
        ".scala" => "scala",
        ".clj" | ".cljs" => "clojure",
        ".hs" => "haskell",
        ".ml" | ".mli" => "ocaml",
        ".fs" | ".fsx" => "fsharp",
        ".dart" => "dart",
        ".lua" => "lua",
        ".r" => "r",
        ".pl" | ".pm" => "perl",
        ".sh" | ".bash" | ".zsh" => "shell",
        ".ps1" => "powershell",
        ".bat" | ".cmd" => "batch",
        ".vim" => "vim",
        ".zig" => "zig",
        ".vue" => "vue",
        ".svelte" => "svelte",
        ".sql" => "sql",
        ".json" => "json",
        ".yaml" | ".yml" => "yaml",
        ".xml" => "xml",
        ".html" | ".htm" => "html",
        ".css" => "css",
        ".scss" => "scss",
        ".sass" => "sass",
        ".md" => "markdown",
        ".rst" => "restructuredtext",
        ".txt" => "text",
        _ => "unknown",
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::Utc;

    /// File record fixture for strategy tests
    pub(crate) fn record(path: &str) -> FileRecord {
        let extension = std::path::Path::new(path)
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
            .unwrap_or_default();
        FileRecord {
            id: 0,
            path: path.to_string(),
            size: 0,
            modified_time: Utc::now(),
            language: detect_language(&extension).to_string(),
            extension,
        }
    }

    struct BrokenStrategy;

    impl ParsingStrategy for BrokenStrategy {
        fn language(&self) -> &'static str {
            "broken"
        }

        fn extensions(&self) -> &'static [&'static str] {
            &[".brk"]
        }

        fn analyze(&self, _content: &str, _file: &FileRecord) -> Result<FileAnalysis, ExtractError> {
            Err(ExtractError::ParseFailed {
                language: "broken".to_string(),
                message: "grammar unavailable".to_string(),
            })
        }
    }

    struct HalfStrategy;

    impl StepExtractor for HalfStrategy {
        type Source<'a> = &'a str;

        fn functions(&self, _source: &&str) -> Result<Vec<FunctionSymbol>, ExtractError> {
            Err(ExtractError::StepFailed {
                step: "functions",
                message: "boom".to_string(),
            })
        }

        fn classes(&self, _source: &&str) -> Result<Vec<ClassSymbol>, ExtractError> {
            Ok(vec![ClassSymbol::new("Kept", 1, 2)])
        }

        fn imports(&self, _source: &&str) -> Result<Vec<ImportRecord>, ExtractError> {
            Err(ExtractError::StepFailed {
                step: "imports",
                message: "bad".to_string(),
            })
        }

        fn language_specific(&self, _source: &&str) -> Result<Value, ExtractError> {
            Ok(serde_json::json!({"ok": true}))
        }
    }

    #[test]
    fn test_detect_language() {
        assert_eq!(detect_language(".py"), "python");
        assert_eq!(detect_language("tsx"), "typescript");
        assert_eq!(detect_language(".H"), "c");
        assert_eq!(detect_language(".xyz"), "unknown");
    }

    #[test]
    fn test_registry_selects_and_falls_back() {
        let registry = StrategyRegistry::default();
        assert_eq!(registry.select(".py").language(), "python");
        assert_eq!(registry.select("TS").language(), "typescript");
        assert_eq!(registry.select(".java").language(), "java");
        assert_eq!(registry.select(".rb").language(), "generic");
        assert!(!registry.has_dedicated(".rb"));
        assert!(registry.languages().contains(&"go"));
    }

    #[test]
    fn test_failed_strategy_retries_generic() {
        let mut registry = StrategyRegistry::empty();
        registry.register(Arc::new(BrokenStrategy));

        let file = record("thing.brk");
        let analysis = analyze_file(&registry, &file, "def helper(x):\n    return x\n");

        assert!(analysis.has_errors());
        assert!(analysis.analysis_errors[0].starts_with("Primary strategy (broken) failed"));
        assert!(analysis.analysis_errors[0].contains("fell back to generic strategy"));
        assert_eq!(analysis.functions.len(), 1);
        assert_eq!(analysis.functions[0].name, "helper");
        assert_eq!(analysis.line_count, 2);
    }

    #[test]
    fn test_steps_fail_independently() {
        let file = record("x.half");
        let analysis = run_steps(&HalfStrategy, &"", "half", &file);

        assert!(analysis.functions.is_empty());
        assert!(analysis.imports.is_empty());
        assert_eq!(analysis.classes.len(), 1);
        assert_eq!(analysis.analysis_errors.len(), 2);
        assert!(analysis.analysis_errors[0].starts_with("Function extraction failed"));
        assert!(analysis.analysis_errors[1].starts_with("Import extraction failed"));
        assert_eq!(analysis.language_specific["half"]["ok"], Value::Bool(true));
    }
}
