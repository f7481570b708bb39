//! Relationship Resolver
//!
//! Scans each declared function's line span for call-like and
//! instantiation-like syntax, keeps the candidates the registry knows, and
//! fans every hit out to all declaring files. Resolution is a sequential
//! fold: edges are collected against an immutable view first, then applied.
//!
//! @module index/resolver

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info};

use super::qualified::generate_qualified_name;
use super::registry::SymbolRegistry;
use super::types::{CallerRef, FileAnalysis, FunctionSymbol, ReverseLookups};
use crate::scan::reader::ContentSource;
use crate::strategy::heuristic::is_keyword;

// =============================================================================
// COMPILED REGEX PATTERNS
// =============================================================================

static CALL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b([A-Za-z_]\w*)\s*\(").unwrap());

static NEW_CALL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bnew\s+([A-Z]\w*)\s*\(").unwrap());
static CAPITALIZED_CALL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b([A-Z]\w*)\s*\(").unwrap());
static STRUCT_LITERAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b([A-Z]\w*)\s*\{").unwrap());
static TYPED_CONSTRUCTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([A-Z]\w*)\s+\w+\s*\(").unwrap());
static ASSOCIATED_NEW: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b([A-Z]\w*)::new\s*\(").unwrap());

// =============================================================================
// LANGUAGE SCANNERS
// =============================================================================

/// Per-language candidate scanning rules
struct Scanner {
    /// Builtins that look like calls but never resolve to project code
    stoplist: &'static [&'static str],
    instantiations: Vec<&'static Regex>,
}

impl Scanner {
    fn for_language(language: &str) -> Scanner {
        match language {
            "python" => Scanner {
                stoplist: &["print", "len", "str", "int", "float", "list", "dict", "set", "tuple"],
                instantiations: vec![&*CAPITALIZED_CALL],
            },
            "javascript" | "typescript" => Scanner {
                stoplist: &["console", "setTimeout", "setInterval"],
                instantiations: vec![&*NEW_CALL],
            },
            "java" => Scanner {
                stoplist: &["System", "String"],
                instantiations: vec![&*NEW_CALL],
            },
            "csharp" => Scanner {
                stoplist: &["Console", "String"],
                instantiations: vec![&*NEW_CALL],
            },
            "go" => Scanner {
                stoplist: &["make", "len", "cap", "append", "panic"],
                instantiations: vec![&*STRUCT_LITERAL],
            },
            "c" | "objective-c" => Scanner {
                stoplist: &["printf", "scanf", "malloc", "free"],
                instantiations: vec![&*NEW_CALL],
            },
            "cpp" => Scanner {
                stoplist: &["printf", "scanf", "malloc", "free"],
                instantiations: vec![&*NEW_CALL, &*TYPED_CONSTRUCTION],
            },
            "rust" => Scanner {
                stoplist: &["Some", "Ok", "Err", "Box", "drop"],
                instantiations: vec![&*STRUCT_LITERAL, &*ASSOCIATED_NEW],
            },
            _ => Scanner {
                stoplist: &[],
                instantiations: vec![&*NEW_CALL],
            },
        }
    }

    fn is_stopped(&self, name: &str) -> bool {
        is_keyword(name) || self.stoplist.contains(&name)
    }

    /// Call candidates in a function body, first occurrence order
    fn calls(&self, span: &str, func: &FunctionSymbol) -> Vec<String> {
        let mut names = Vec::new();
        collect_candidates(&CALL, span, func, &mut names, |name| !self.is_stopped(name));
        names
    }

    /// Instantiation candidates in a function body, first occurrence order
    fn instantiations(&self, span: &str, func: &FunctionSymbol) -> Vec<String> {
        let mut names = Vec::new();
        for pattern in &self.instantiations {
            collect_candidates(pattern, span, func, &mut names, |name| !self.is_stopped(name));
        }
        names
    }
}

/// Collect capture-group-1 names, skipping the function's own name where it
/// is declared on the first line of the span
fn collect_candidates(
    pattern: &Regex,
    span: &str,
    func: &FunctionSymbol,
    out: &mut Vec<String>,
    keep: impl Fn(&str) -> bool,
) {
    let first_line_end = span.find('\n').unwrap_or(span.len());
    let mut declaration_skipped = false;

    for caps in pattern.captures_iter(span) {
        let Some(name) = caps.get(1) else {
            continue;
        };
        if !declaration_skipped && name.start() < first_line_end && name.as_str() == func.name {
            declaration_skipped = true;
            continue;
        }
        if keep(name.as_str()) && !out.iter().any(|n| n == name.as_str()) {
            out.push(name.as_str().to_string());
        }
    }
}

/// Lines `line_start..=line_end` (1-based) of the content
fn function_span(lines: &[&str], func: &FunctionSymbol) -> Option<String> {
    let start = func.line_start.checked_sub(1)? as usize;
    if start >= lines.len() {
        return None;
    }
    let end = (func.line_end as usize).clamp(start + 1, lines.len());
    Some(lines[start..end].join("\n"))
}

// =============================================================================
// RESOLUTION
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EdgeKind {
    Call,
    Instantiation,
}

/// A resolved reference from one function to a declaration in another file
#[derive(Debug, Clone)]
struct Edge {
    kind: EdgeKind,
    /// Index into the analysis slice
    caller_file: usize,
    caller_function: usize,
    target_file: usize,
    target_name: String,
}

/// Outcome of a resolution pass
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub reverse_lookups: ReverseLookups,
    pub call_edges: usize,
    pub instantiation_edges: usize,
    /// Files whose content could not be read; their declarations stay
    pub unreadable_files: Vec<String>,
}

/// Resolve calls, instantiations, imports and decorators across all files.
///
/// Fills `calls`/`called_by`/`instantiated_by` on the symbols in place and
/// returns the reverse lookup tables.
pub fn resolve(
    files: &mut [FileAnalysis],
    registry: &SymbolRegistry,
    source: &dyn ContentSource,
) -> Resolution {
    let index_of: HashMap<u32, usize> = files
        .iter()
        .enumerate()
        .map(|(i, f)| (f.file.id, i))
        .collect();

    let mut resolution = Resolution::default();
    let edges = collect_edges(files, registry, source, &index_of, &mut resolution.unreadable_files);

    for edge in &edges {
        match edge.kind {
            EdgeKind::Call => resolution.call_edges += 1,
            EdgeKind::Instantiation => resolution.instantiation_edges += 1,
        }
        apply_edge(files, edge, &mut resolution.reverse_lookups);
    }

    record_imports(files, &mut resolution.reverse_lookups);
    record_decorators(files, &mut resolution.reverse_lookups);

    info!(
        calls = resolution.call_edges,
        instantiations = resolution.instantiation_edges,
        unreadable = resolution.unreadable_files.len(),
        "Resolved relationships"
    );

    resolution
}

fn collect_edges(
    files: &[FileAnalysis],
    registry: &SymbolRegistry,
    source: &dyn ContentSource,
    index_of: &HashMap<u32, usize>,
    unreadable: &mut Vec<String>,
) -> Vec<Edge> {
    let mut edges = Vec::new();

    for (caller_file, analysis) in files.iter().enumerate() {
        if analysis.functions.is_empty() {
            continue;
        }
        let Some(content) = source.read(&analysis.file.path) else {
            debug!(file = %analysis.file.path, "Skipping unreadable file during resolution");
            unreadable.push(analysis.file.path.clone());
            continue;
        };

        let lines: Vec<&str> = content.lines().collect();
        let scanner = Scanner::for_language(&analysis.file.language);

        for (caller_function, func) in analysis.functions.iter().enumerate() {
            let Some(span) = function_span(&lines, func) else {
                continue;
            };

            let calls = scanner.calls(&span, func).into_iter().map(|n| (EdgeKind::Call, n));
            let news = scanner
                .instantiations(&span, func)
                .into_iter()
                .map(|n| (EdgeKind::Instantiation, n));

            for (kind, name) in calls.chain(news) {
                let targets = match kind {
                    EdgeKind::Call => registry.function_files(&name),
                    EdgeKind::Instantiation => registry.class_files(&name),
                };
                for target_id in targets {
                    let Some(&target_file) = index_of.get(target_id) else {
                        continue;
                    };
                    edges.push(Edge {
                        kind,
                        caller_file,
                        caller_function,
                        target_file,
                        target_name: name.clone(),
                    });
                }
            }
        }
    }

    edges
}

fn apply_edge(files: &mut [FileAnalysis], edge: &Edge, reverse: &mut ReverseLookups) {
    let caller = &files[edge.caller_file];
    let caller_name = caller.functions[edge.caller_function].name.clone();
    let caller_ref = CallerRef {
        file_id: caller.file.id,
        caller_qualified: generate_qualified_name(&caller.file.path, &caller_name),
        caller: caller_name,
        caller_file_path: caller.file.path.clone(),
    };

    let target_path = files[edge.target_file].file.path.clone();
    let target_qualified = generate_qualified_name(&target_path, &edge.target_name);

    match edge.kind {
        EdgeKind::Call => {
            push_unique(
                &mut files[edge.caller_file].functions[edge.caller_function].calls,
                target_qualified.clone(),
            );
            for func in files[edge.target_file]
                .functions
                .iter_mut()
                .filter(|f| f.name == edge.target_name)
            {
                push_unique(&mut func.called_by, caller_ref.caller_qualified.clone());
            }
            insert_both(
                &mut reverse.function_callers,
                &target_qualified,
                &edge.target_name,
                caller_ref,
            );
        }
        EdgeKind::Instantiation => {
            for class in files[edge.target_file]
                .classes
                .iter_mut()
                .filter(|c| c.name == edge.target_name)
            {
                push_unique(&mut class.instantiated_by, caller_ref.caller_qualified.clone());
            }
            insert_both(
                &mut reverse.class_instantiators,
                &target_qualified,
                &edge.target_name,
                caller_ref,
            );
        }
    }
}

/// Record a referrer under both the qualified and the plain key
fn insert_both(
    table: &mut std::collections::BTreeMap<String, Vec<CallerRef>>,
    qualified: &str,
    plain: &str,
    caller: CallerRef,
) {
    for key in [qualified, plain] {
        let entries = table.entry(key.to_string()).or_default();
        if !entries.contains(&caller) {
            entries.push(caller.clone());
        }
    }
}

fn record_imports(files: &[FileAnalysis], reverse: &mut ReverseLookups) {
    for analysis in files {
        for import in &analysis.imports {
            let importers = reverse.imports_module.entry(import.module.clone()).or_default();
            if !importers.contains(&analysis.file.id) {
                importers.push(analysis.file.id);
            }
        }
    }
}

fn record_decorators(files: &[FileAnalysis], reverse: &mut ReverseLookups) {
    for analysis in files {
        for func in &analysis.functions {
            for decorator in &func.decorators {
                push_unique(
                    reverse.has_decorator.entry(decorator.clone()).or_default(),
                    generate_qualified_name(&analysis.file.path, &func.name),
                );
            }
        }
    }
}

fn push_unique(list: &mut Vec<String>, value: String) {
    if !list.contains(&value) {
        list.push(value);
    }
}
