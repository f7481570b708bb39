//! Generic fallback strategy
//!
//! Line-anchored regex patterns common to many languages. Serves every
//! extension without a dedicated strategy and is the retry path when a
//! dedicated strategy cannot run.
//!
//! @module strategy/generic

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};

use super::heuristic::{is_keyword, methods_within, parameters_in, ParamStyle, SourceLines};
use super::{run_steps, ExtractError, ParsingStrategy, StepExtractor};
use crate::index::types::{ClassSymbol, FileAnalysis, FileRecord, FunctionSymbol, ImportKind, ImportRecord};

// =============================================================================
// COMPILED REGEX PATTERNS
// =============================================================================

static FUNCTION_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        // function / def / fn / func / sub / proc
        Regex::new(r"^\s*(?:public|private|protected)?\s*(?:static)?\s*(?:async)?\s*(?:function|def|fn|func|sub|proc)\s+(\w+)\s*\(").unwrap(),
        // JavaScript object method
        Regex::new(r"^\s*(\w+)\s*:\s*function\s*\(").unwrap(),
        // JavaScript function assignment
        Regex::new(r"^\s*(\w+)\s*=\s*function\s*\(").unwrap(),
        // Arrow functions
        Regex::new(r"^\s*(?:const|let|var)\s+(\w+)\s*=\s*(?:async\s+)?\([^)]*\)\s*=>").unwrap(),
        // Java/C# methods
        Regex::new(r"^\s*(?:public|private|protected)?\s*(?:static)?\s*\w+\s+(\w+)\s*\(").unwrap(),
    ]
});

/// (pattern, capture group holding the first base)
static CLASS_PATTERNS: Lazy<Vec<(Regex, Option<usize>)>> = Lazy::new(|| {
    vec![
        (Regex::new(r"^\s*(?:public|private|protected)?\s*(?:abstract)?\s*class\s+(\w+)(?:\s*:\s*(\w+))?").unwrap(), Some(2)),
        (Regex::new(r"^\s*class\s+(\w+)(?:\(([^),]+)[^)]*\))?").unwrap(), Some(2)),
        (Regex::new(r"^\s*struct\s+(\w+)").unwrap(), None),
        (Regex::new(r"^\s*interface\s+(\w+)").unwrap(), None),
        (Regex::new(r"^\s*type\s+(\w+)\s+struct").unwrap(), None),
    ]
});

static IMPORT_PATTERNS: Lazy<Vec<(Regex, ImportKind)>> = Lazy::new(|| {
    vec![
        (Regex::new(r"^\s*import\s+(.+)").unwrap(), ImportKind::Import),
        (Regex::new(r"^\s*from\s+(.+?)\s+import\s+(.+)").unwrap(), ImportKind::From),
        (Regex::new(r#"^\s*#include\s*[<"](.+?)[>"]"#).unwrap(), ImportKind::Include),
        (Regex::new(r#"^\s*require\s*\(['"](.+?)['"]\)"#).unwrap(), ImportKind::Require),
        (Regex::new(r"^\s*use\s+(.+)").unwrap(), ImportKind::Use),
        (Regex::new(r"^\s*using\s+(.+)").unwrap(), ImportKind::Using),
    ]
});

const NOT_FUNCTIONS: &[&str] = &["if", "for", "while", "switch", "try", "catch", "class", "struct"];

// =============================================================================
// STRATEGY
// =============================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct GenericStrategy;

impl ParsingStrategy for GenericStrategy {
    fn language(&self) -> &'static str {
        "generic"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[]
    }

    fn analyze(&self, content: &str, file: &FileRecord) -> Result<FileAnalysis, ExtractError> {
        let lines = SourceLines::new(content);
        Ok(run_steps(self, &lines, self.language(), file))
    }
}

impl StepExtractor for GenericStrategy {
    type Source<'a> = SourceLines<'a>;

    fn functions(&self, src: &SourceLines<'_>) -> Result<Vec<FunctionSymbol>, ExtractError> {
        let mut functions = Vec::new();

        for (i, line) in src.lines.iter().enumerate() {
            let Some(name) = FUNCTION_PATTERNS
                .iter()
                .find_map(|p| p.captures(line))
                .and_then(|c| c.get(1))
                .map(|m| m.as_str())
            else {
                continue;
            };
            if NOT_FUNCTIONS.contains(&name) || is_keyword(name) {
                continue;
            }

            let start = i as u32 + 1;
            let mut func = FunctionSymbol::new(name, start, src.block_end(start));
            func.parameters = parameters_in(line, ParamStyle::NameFirst);
            func.is_async = line.to_lowercase().contains("async");
            functions.push(func);
        }

        Ok(functions)
    }

    fn classes(&self, src: &SourceLines<'_>) -> Result<Vec<ClassSymbol>, ExtractError> {
        let functions = self.functions(src)?;
        let mut classes = Vec::new();

        for (i, line) in src.lines.iter().enumerate() {
            let Some((caps, base_group)) = CLASS_PATTERNS
                .iter()
                .find_map(|(p, base)| p.captures(line).map(|c| (c, *base)))
            else {
                continue;
            };
            let Some(name) = caps.get(1) else {
                continue;
            };

            let start = i as u32 + 1;
            let mut class = ClassSymbol::new(name.as_str(), start, src.block_end(start));
            class.inherits_from = base_group
                .and_then(|g| caps.get(g))
                .map(|m| m.as_str().trim().to_string())
                .filter(|b| !b.is_empty());
            class.methods = methods_within(&functions, class.line_start, class.line_end);
            classes.push(class);
        }

        Ok(classes)
    }

    fn imports(&self, src: &SourceLines<'_>) -> Result<Vec<ImportRecord>, ExtractError> {
        let mut imports = Vec::new();

        for (i, line) in src.lines.iter().enumerate() {
            let Some((caps, kind)) = IMPORT_PATTERNS
                .iter()
                .find_map(|(p, kind)| p.captures(line).map(|c| (c, *kind)))
            else {
                continue;
            };
            let module = caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
            let mut record = ImportRecord::new(module.trim_end_matches(';'), kind, i as u32 + 1);
            if kind == ImportKind::From {
                record.imported_names = caps
                    .get(2)
                    .map(|m| m.as_str().split(',').map(|n| n.trim().to_string()).collect())
                    .unwrap_or_default();
            }
            imports.push(record);
        }

        Ok(imports)
    }

    fn language_specific(&self, src: &SourceLines<'_>) -> Result<Value, ExtractError> {
        Ok(json!({
            "line_count": src.len(),
            "char_count": src.content.chars().count(),
            "is_text_file": !src.content.contains('\0'),
            "detected_language": detect_language_hint(src.content),
            "has_comments": has_comments(src.content),
            "indentation_style": indentation_style(&src.lines),
        }))
    }
}

// =============================================================================
// CONTENT HINTS
// =============================================================================

/// Best guess at the language from content alone
fn detect_language_hint(content: &str) -> &'static str {
    let has = |s: &str| content.contains(s);
    if has("def ") && has("import ") {
        "python"
    } else if has("function ") && (has("var ") || has("let ") || has("const ")) {
        "javascript"
    } else if has("public class ") || has("private class ") {
        "java"
    } else if has("#include") && (has("int main") || has("void main")) {
        "c"
    } else if has("func ") && has("package ") {
        "go"
    } else if has("fn ") && (has("let ") || has("mut ")) {
        "rust"
    } else {
        "unknown"
    }
}

fn has_comments(content: &str) -> bool {
    ["//", "#", "/*", "--", ";", "%"]
        .iter()
        .any(|marker| content.contains(marker))
}

fn indentation_style(lines: &[&str]) -> &'static str {
    let (mut tabs, mut spaces) = (0usize, 0usize);
    for line in lines {
        if line.starts_with('\t') {
            tabs += 1;
        } else if line.starts_with("  ") {
            spaces += 1;
        }
    }
    match tabs.cmp(&spaces) {
        std::cmp::Ordering::Greater => "tabs",
        std::cmp::Ordering::Less => "spaces",
        std::cmp::Ordering::Equal => "mixed",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::tests::record;

    #[test]
    fn test_ruby_like_source() {
        let src = "require 'json'\n\nclass Parser < Base\n  def parse(input, strict)\n    input\n  end\nend\n\ndef helper\nend\n";
        let analysis = GenericStrategy.analyze(src, &record("parser.rb")).unwrap();

        assert!(analysis.analysis_errors.is_empty());
        assert_eq!(analysis.classes.len(), 1);
        assert_eq!(analysis.classes[0].name, "Parser");
        assert_eq!(analysis.classes[0].methods, vec!["parse"]);

        let parse = analysis.functions.iter().find(|f| f.name == "parse").unwrap();
        assert_eq!(parse.parameters, vec!["input", "strict"]);
        assert_eq!(parse.line_start, 4);
    }

    #[test]
    fn test_imports() {
        let src = "#include <stdio.h>\nfrom os import path, sep\nuse strict;\nimport foo.bar\n";
        let analysis = GenericStrategy.analyze(src, &record("x.pl")).unwrap();
        let kinds: Vec<_> = analysis.imports.iter().map(|i| i.import_type).collect();
        assert_eq!(
            kinds,
            vec![ImportKind::Include, ImportKind::From, ImportKind::Use, ImportKind::Import]
        );
        assert_eq!(analysis.imports[0].module, "stdio.h");
        assert_eq!(analysis.imports[1].imported_names, vec!["path", "sep"]);
        assert_eq!(analysis.imports[2].module, "strict");
    }

    #[test]
    fn test_keywords_are_not_functions() {
        let src = "  if (x) {\n  }\n  while (y) {\n  }\n";
        let analysis = GenericStrategy.analyze(src, &record("x.lua")).unwrap();
        assert!(analysis.functions.is_empty());
    }

    #[test]
    fn test_language_specific_hints() {
        let src = "package main\n\nfunc main() {\n\tprintln(1) // hi\n}\n";
        let analysis = GenericStrategy.analyze(src, &record("main.unknownext")).unwrap();
        let data = &analysis.language_specific["generic"];
        assert_eq!(data["detected_language"], json!("go"));
        assert_eq!(data["has_comments"], json!(true));
        assert_eq!(data["indentation_style"], json!("tabs"));
        assert_eq!(data["line_count"], json!(5));
        assert_eq!(analysis.functions[0].name, "main");
    }
}
