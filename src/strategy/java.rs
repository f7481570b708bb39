//! Java strategy (heuristic)
//!
//! @module strategy/java

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};

use super::heuristic::{is_keyword, methods_within, split_parameters, ParamStyle, SourceLines};
use super::{run_steps, ExtractError, ParsingStrategy, StepExtractor};
use crate::index::types::{ClassSymbol, FileAnalysis, FileRecord, FunctionSymbol, ImportKind, ImportRecord};

// =============================================================================
// COMPILED REGEX PATTERNS
// =============================================================================

/// Groups: 1 return type (or first modifier for constructors), 2 name, 3 parameters
static METHOD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)^[ \t]*(?:@\w+(?:\([^)]*\))?\s+)*(?:(?:public|private|protected|static|final|abstract|synchronized|native|default|strictfp)\s+)*(?:<[^>]*>\s+)?([\w.]+)(?:<[^(){};]*>)?(?:\[\])*\s+(\w+)\s*\(([^)]*)\)\s*(?:throws\s+[\w\s,.]+?)?\s*\{",
    )
    .unwrap()
});

/// Groups: 1 kind, 2 name, 3 superclass, 4 implemented interfaces
static CLASS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)^[ \t]*(?:@\w+(?:\([^)]*\))?\s+)*(?:(?:public|private|protected|abstract|final|static|sealed|non-sealed)\s+)*(class|interface|enum|record)\s+(\w+)(?:<[^{]*?>)?(?:\s*\([^)]*\))?(?:\s+extends\s+([\w.]+)(?:<[^{]*?>)?(?:\s*,\s*[\w.]+(?:<[^{]*?>)?)*)?(?:\s+implements\s+([\w\s,.<>]+?))?\s*\{",
    )
    .unwrap()
});

static IMPORT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*import\s+(?:static\s+)?([\w.]+(?:\.\*)?)\s*;").unwrap());

static PACKAGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^\s*package\s+([\w.]+)\s*;").unwrap());

static ANNOTATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"@([A-Za-z_]\w*)").unwrap());

/// Words that can precede `name(` without declaring anything
const NOT_RETURN_TYPES: &[&str] = &["new", "return", "else", "throw", "case", "yield"];

// =============================================================================
// STRATEGY
// =============================================================================

pub struct JavaStrategy;

impl ParsingStrategy for JavaStrategy {
    fn language(&self) -> &'static str {
        "java"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".java"]
    }

    fn analyze(&self, content: &str, file: &FileRecord) -> Result<FileAnalysis, ExtractError> {
        Ok(run_steps(self, &SourceLines::new(content), self.language(), file))
    }
}

impl StepExtractor for JavaStrategy {
    type Source<'a> = SourceLines<'a>;

    fn functions(&self, src: &SourceLines<'_>) -> Result<Vec<FunctionSymbol>, ExtractError> {
        let mut functions = Vec::new();

        for caps in METHOD.captures_iter(src.content) {
            let (Some(whole), Some(ret), Some(name)) = (caps.get(0), caps.get(1), caps.get(2)) else {
                continue;
            };
            if is_keyword(name.as_str()) || NOT_RETURN_TYPES.contains(&ret.as_str()) {
                continue;
            }

            let start = src.line_of(name.start());
            let mut func = FunctionSymbol::new(name.as_str(), start, src.block_end(start));
            func.parameters = caps
                .get(3)
                .map(|p| split_parameters(p.as_str(), ParamStyle::NameLast))
                .unwrap_or_default();
            func.decorators = ANNOTATION
                .captures_iter(&src.content[whole.start()..name.start()])
                .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
                .collect();
            functions.push(func);
        }

        Ok(functions)
    }

    fn classes(&self, src: &SourceLines<'_>) -> Result<Vec<ClassSymbol>, ExtractError> {
        let functions = self.functions(src)?;
        let mut classes = Vec::new();

        for caps in CLASS.captures_iter(src.content) {
            let Some(name) = caps.get(2) else {
                continue;
            };
            let start = src.line_of(name.start());
            let mut class = ClassSymbol::new(name.as_str(), start, src.block_end(start));
            class.inherits_from = caps.get(3).map(|m| m.as_str().to_string());
            class.methods = methods_within(&functions, class.line_start, class.line_end);
            classes.push(class);
        }

        Ok(classes)
    }

    fn imports(&self, src: &SourceLines<'_>) -> Result<Vec<ImportRecord>, ExtractError> {
        let mut imports = Vec::new();
        for caps in IMPORT.captures_iter(src.content) {
            let Some(module) = caps.get(1) else {
                continue;
            };
            let mut record = ImportRecord::new(module.as_str(), ImportKind::Import, src.line_of(module.start()));
            if let Some(last) = module.as_str().rsplit('.').next() {
                record.imported_names.push(last.to_string());
            }
            imports.push(record);
        }
        Ok(imports)
    }

    fn language_specific(&self, src: &SourceLines<'_>) -> Result<Value, ExtractError> {
        let package = PACKAGE
            .captures(src.content)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str());

        let mut annotations: Vec<&str> = ANNOTATION
            .captures_iter(src.content)
            .filter_map(|c| c.get(1).map(|m| m.as_str()))
            .filter(|a| *a != "interface")
            .collect();
        annotations.sort_unstable();
        annotations.dedup();

        let mut interface_implementations: BTreeMap<&str, Vec<String>> = BTreeMap::new();
        for caps in CLASS.captures_iter(src.content) {
            let (Some(name), Some(list)) = (caps.get(2), caps.get(4)) else {
                continue;
            };
            let interfaces = split_type_list(list.as_str());
            if !interfaces.is_empty() {
                interface_implementations.insert(name.as_str(), interfaces);
            }
        }

        Ok(json!({
            "package": package,
            "annotations": annotations,
            "interface_implementations": interface_implementations,
        }))
    }
}

/// `Comparable<Foo>, Serializable` -> `[Comparable, Serializable]`
fn split_type_list(list: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut depth = 0i32;
    let mut current = String::new();
    for ch in list.chars() {
        match ch {
            '<' => depth += 1,
            '>' => depth -= 1,
            ',' if depth == 0 => {
                names.push(std::mem::take(&mut current));
            }
            _ if depth == 0 => current.push(ch),
            _ => {}
        }
    }
    names.push(current);
    names
        .into_iter()
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .collect()
}
