//! Rust strategy (tree-sitter)
//!
//! Structs, enums and traits are class-like symbols. Methods come from
//! `impl` blocks in the same file, keyed by the implemented type.
//!
//! @module strategy/rust

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};
use tree_sitter::Node;

use super::treesitter::{self, header_broken, line_end, line_start, ParsedSource};
use super::{run_steps, ExtractError, ParsingStrategy, StepExtractor};
use crate::index::types::{ClassSymbol, FileAnalysis, FileRecord, FunctionSymbol, ImportKind, ImportRecord};

static DERIVE: Lazy<Regex> = Lazy::new(|| Regex::new(r"derive\s*\(([^)]*)\)").unwrap());

const FUNCTION_QUERY: &str = "(function_item) @function";
const TYPE_KINDS: &[&str] = &["struct_item", "enum_item", "trait_item"];

pub struct RustStrategy;

impl ParsingStrategy for RustStrategy {
    fn language(&self) -> &'static str {
        "rust"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".rs"]
    }

    fn analyze(&self, content: &str, file: &FileRecord) -> Result<FileAnalysis, ExtractError> {
        let parsed = treesitter::parse("rust", content)?;
        let mut analysis = run_steps(self, &parsed, self.language(), file);
        analysis.analysis_errors.extend(parsed.syntax_errors());
        Ok(analysis)
    }
}

impl StepExtractor for RustStrategy {
    type Source<'a> = ParsedSource<'a>;

    fn functions(&self, src: &ParsedSource<'_>) -> Result<Vec<FunctionSymbol>, ExtractError> {
        let mut functions = Vec::new();
        for node in src.query_nodes(FUNCTION_QUERY, "function")? {
            if header_broken(node, &["name", "parameters", "body"]) {
                continue;
            }
            let mut func = FunctionSymbol::new(
                src.field_text(node, "name").unwrap_or_default(),
                line_start(node),
                line_end(node),
            );
            func.parameters = node
                .child_by_field_name("parameters")
                .map(|p| parameters(src, p))
                .unwrap_or_default();
            func.is_async = is_async(src, node);
            func.decorators = attributes(src, node);
            functions.push(func);
        }
        Ok(functions)
    }

    fn classes(&self, src: &ParsedSource<'_>) -> Result<Vec<ClassSymbol>, ExtractError> {
        let impls = impl_methods(src);
        let mut classes = Vec::new();

        for node in src.nodes_of_kind(TYPE_KINDS) {
            if header_broken(node, &["name"]) {
                continue;
            }
            let name = src.field_text(node, "name").unwrap_or_default();
            let mut class = ClassSymbol::new(name, line_start(node), line_end(node));
            class.methods = if node.kind() == "trait_item" {
                trait_methods(src, node)
            } else {
                impls.get(name).cloned().unwrap_or_default()
            };
            classes.push(class);
        }
        Ok(classes)
    }

    fn imports(&self, src: &ParsedSource<'_>) -> Result<Vec<ImportRecord>, ExtractError> {
        let mut imports = Vec::new();
        for node in src.nodes_of_kind(&["use_declaration"]) {
            if node.has_error() {
                continue;
            }
            let Some(argument) = src.field_text(node, "argument") else {
                continue;
            };
            imports.push(use_record(argument, line_start(node)));
        }
        Ok(imports)
    }

    fn language_specific(&self, src: &ParsedSource<'_>) -> Result<Value, ExtractError> {
        let traits: Vec<&str> = src
            .nodes_of_kind(&["trait_item"])
            .into_iter()
            .filter_map(|n| src.field_text(n, "name"))
            .collect();

        let mut derives: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for node in src.nodes_of_kind(&["struct_item", "enum_item"]) {
            let Some(name) = src.field_text(node, "name") else {
                continue;
            };
            let derived: Vec<String> = preceding_attributes(node)
                .into_iter()
                .filter_map(|attr| DERIVE.captures(src.text(attr)))
                .flat_map(|caps| {
                    caps.get(1)
                        .map(|m| m.as_str())
                        .unwrap_or_default()
                        .split(',')
                        .map(|d| d.trim().to_string())
                        .filter(|d| !d.is_empty())
                        .collect::<Vec<_>>()
                })
                .collect();
            if !derived.is_empty() {
                derives.insert(name.to_string(), derived);
            }
        }

        Ok(json!({
            "impl_methods": impl_methods(src),
            "traits": traits,
            "derives": derives,
        }))
    }
}

// =============================================================================
// HELPERS
// =============================================================================

fn parameters(src: &ParsedSource<'_>, params: Node<'_>) -> Vec<String> {
    let mut names = Vec::new();
    let mut cursor = params.walk();
    for param in params.named_children(&mut cursor) {
        match param.kind() {
            "self_parameter" => names.push("self".to_string()),
            "parameter" => {
                if let Some(pattern) = src.field_text(param, "pattern") {
                    names.push(pattern.trim_start_matches("mut ").trim().to_string());
                }
            }
            _ => {}
        }
    }
    names
}

fn is_async(src: &ParsedSource<'_>, func: Node<'_>) -> bool {
    let mut cursor = func.walk();
    let found = func
        .named_children(&mut cursor)
        .any(|c| c.kind() == "function_modifiers" && src.text(c).split_whitespace().any(|w| w == "async"));
    found
}

/// Outer attributes directly above an item, nearest last
fn preceding_attributes(item: Node<'_>) -> Vec<Node<'_>> {
    let mut attrs = Vec::new();
    let mut current = item.prev_named_sibling();
    while let Some(node) = current {
        match node.kind() {
            "attribute_item" => attrs.push(node),
            "line_comment" | "block_comment" => {}
            _ => break,
        }
        current = node.prev_named_sibling();
    }
    attrs.reverse();
    attrs
}

/// Attribute paths applied to an item, e.g. `test`, `tokio::main`
fn attributes(src: &ParsedSource<'_>, item: Node<'_>) -> Vec<String> {
    preceding_attributes(item)
        .into_iter()
        .filter_map(|attr| {
            let inner = src
                .text(attr)
                .trim_start_matches("#[")
                .trim_end_matches(']');
            let path = inner.split(['(', '=', ' ']).next().unwrap_or(inner).trim();
            (!path.is_empty() && path != "derive").then(|| path.to_string())
        })
        .collect()
}

/// Implemented type name -> method names across every `impl` block
fn impl_methods(src: &ParsedSource<'_>) -> BTreeMap<String, Vec<String>> {
    let mut map: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for block in src.nodes_of_kind(&["impl_item"]) {
        if header_broken(block, &["type"]) {
            continue;
        }
        let ty = src.field_text(block, "type").unwrap_or_default();
        let ty = ty.split('<').next().unwrap_or(ty).trim();
        let Some(body) = block.child_by_field_name("body") else {
            continue;
        };
        let mut cursor = body.walk();
        let methods = map.entry(ty.to_string()).or_default();
        for item in body.named_children(&mut cursor) {
            if item.kind() == "function_item" {
                if let Some(name) = src.field_text(item, "name") {
                    methods.push(name.to_string());
                }
            }
        }
    }
    map
}

fn trait_methods(src: &ParsedSource<'_>, item: Node<'_>) -> Vec<String> {
    let Some(body) = item.child_by_field_name("body") else {
        return Vec::new();
    };
    let mut cursor = body.walk();
    let names = body
        .named_children(&mut cursor)
        .filter(|c| matches!(c.kind(), "function_item" | "function_signature_item"))
        .filter_map(|c| src.field_text(c, "name"))
        .map(str::to_string)
        .collect();
    names
}

/// `std::collections::{HashMap, BTreeMap}` -> module `std::collections`, names `[HashMap, BTreeMap]`
fn use_record(argument: &str, line: u32) -> ImportRecord {
    let argument = argument.trim();
    if let Some((module, rest)) = argument.split_once("::{") {
        let mut record = ImportRecord::new(module, ImportKind::Use, line);
        record.imported_names = rest
            .trim_end_matches('}')
            .split(',')
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .collect();
        return record;
    }

    let mut record = ImportRecord::new(argument, ImportKind::Use, line);
    let last = argument.rsplit("::").next().unwrap_or(argument);
    let last = last.split(" as ").next().unwrap_or(last).trim();
    if !last.is_empty() {
        record.imported_names.push(last.to_string());
    }
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::tests::record;

    const SRC: &str = r#"use std::collections::{HashMap, BTreeMap};
use crate::store::Store;

#[derive(Debug, Clone)]
pub struct Cache {
    items: HashMap<String, u32>,
}

pub trait Evict {
    fn evict(&mut self);
}

impl Cache {
    pub fn new() -> Self {
        Cache { items: HashMap::new() }
    }

    pub async fn load(&mut self, key: &str, mut retries: u8) {}
}

#[tokio::main]
async fn main() {}
"#;

    #[test]
    fn test_rust_symbols() {
        let analysis = RustStrategy.analyze(SRC, &record("cache.rs")).unwrap();
        assert!(analysis.analysis_errors.is_empty(), "{:?}", analysis.analysis_errors);

        let names: Vec<_> = analysis.functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["new", "load", "main"]);

        let load = &analysis.functions[1];
        assert!(load.is_async);
        assert_eq!(load.parameters, vec!["self", "key", "retries"]);

        let main = &analysis.functions[2];
        assert!(main.is_async);
        assert_eq!(main.decorators, vec!["tokio::main"]);

        let cache = analysis.classes.iter().find(|c| c.name == "Cache").unwrap();
        assert_eq!(cache.methods, vec!["new", "load"]);
        let evict = analysis.classes.iter().find(|c| c.name == "Evict").unwrap();
        assert_eq!(evict.methods, vec!["evict"]);

        assert_eq!(analysis.imports[0].module, "std::collections");
        assert_eq!(analysis.imports[0].imported_names, vec!["HashMap", "BTreeMap"]);
        assert_eq!(analysis.imports[1].imported_names, vec!["Store"]);
    }

    #[test]
    fn test_rust_language_specific() {
        let analysis = RustStrategy.analyze(SRC, &record("cache.rs")).unwrap();
        let specific = &analysis.language_specific["rust"];
        assert_eq!(specific["traits"], json!(["Evict"]));
        assert_eq!(specific["derives"]["Cache"], json!(["Debug", "Clone"]));
        assert_eq!(specific["impl_methods"]["Cache"], json!(["new", "load"]));
    }
}
