//! Python strategy (tree-sitter)
//!
//! @module strategy/python

use serde_json::{json, Map, Value};
use tree_sitter::Node;

use super::treesitter::{self, header_broken, has_keyword_child, line_end, line_start, ParsedSource};
use super::{run_steps, ExtractError, ParsingStrategy, StepExtractor};
use crate::index::types::{ClassSymbol, FileAnalysis, FileRecord, FunctionSymbol, ImportKind, ImportRecord};

const FUNCTION_QUERY: &str = "(function_definition) @function";
const CLASS_QUERY: &str = "(class_definition) @class";

pub struct PythonStrategy;

impl ParsingStrategy for PythonStrategy {
    fn language(&self) -> &'static str {
        "python"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".py", ".pyw", ".pyi"]
    }

    fn analyze(&self, content: &str, file: &FileRecord) -> Result<FileAnalysis, ExtractError> {
        let parsed = treesitter::parse("python", content)?;
        let mut analysis = run_steps(self, &parsed, self.language(), file);
        analysis.analysis_errors.extend(parsed.syntax_errors());
        Ok(analysis)
    }
}

impl StepExtractor for PythonStrategy {
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
            func.is_async = has_keyword_child(node, "async");
            func.decorators = decorators(src, node);
            functions.push(func);
        }
        Ok(functions)
    }

    fn classes(&self, src: &ParsedSource<'_>) -> Result<Vec<ClassSymbol>, ExtractError> {
        let mut classes = Vec::new();
        for node in src.query_nodes(CLASS_QUERY, "class")? {
            if header_broken(node, &["name", "body"]) {
                continue;
            }
            if node
                .child_by_field_name("superclasses")
                .is_some_and(|s| s.has_error())
            {
                continue;
            }

            let mut class = ClassSymbol::new(
                src.field_text(node, "name").unwrap_or_default(),
                line_start(node),
                line_end(node),
            );
            class.inherits_from = bases(src, node).into_iter().next();
            class.methods = node
                .child_by_field_name("body")
                .map(|body| methods(src, body))
                .unwrap_or_default();
            classes.push(class);
        }
        Ok(classes)
    }

    fn imports(&self, src: &ParsedSource<'_>) -> Result<Vec<ImportRecord>, ExtractError> {
        let mut imports = Vec::new();

        for node in src.nodes_of_kind(&["import_statement", "import_from_statement"]) {
            if node.has_error() {
                continue;
            }
            let line = line_start(node);
            let mut cursor = node.walk();

            if node.kind() == "import_statement" {
                for name in node.children_by_field_name("name", &mut cursor) {
                    let module = imported_path(src, name);
                    imports.push(ImportRecord::new(module, ImportKind::Import, line));
                }
                continue;
            }

            let Some(module) = src.field_text(node, "module_name") else {
                continue;
            };
            let mut record = ImportRecord::new(module, ImportKind::From, line);
            record.imported_names = node
                .children_by_field_name("name", &mut cursor)
                .map(|n| imported_path(src, n).to_string())
                .collect();
            if record.imported_names.is_empty() {
                let mut cursor = node.walk();
                let wildcard = node
                    .children(&mut cursor)
                    .any(|c| c.kind() == "wildcard_import");
                if wildcard {
                    record.imported_names.push("*".to_string());
                }
            }
            imports.push(record);
        }

        Ok(imports)
    }

    fn language_specific(&self, src: &ParsedSource<'_>) -> Result<Value, ExtractError> {
        let mut decorator_names: Vec<String> = Vec::new();
        let mut async_functions = Vec::new();

        for node in src.query_nodes(FUNCTION_QUERY, "function")? {
            if header_broken(node, &["name"]) {
                continue;
            }
            let name = src.field_text(node, "name").unwrap_or_default();
            if has_keyword_child(node, "async") {
                async_functions.push(name.to_string());
            }
            decorator_names.extend(decorators(src, node));
        }
        decorator_names.sort();
        decorator_names.dedup();

        let mut class_inheritance = Map::new();
        for node in src.query_nodes(CLASS_QUERY, "class")? {
            if header_broken(node, &["name"]) {
                continue;
            }
            let bases = bases(src, node);
            if !bases.is_empty() {
                let name = src.field_text(node, "name").unwrap_or_default();
                class_inheritance.insert(name.to_string(), json!(bases));
            }
        }

        Ok(json!({
            "decorators": decorator_names,
            "async_functions": async_functions,
            "class_inheritance": class_inheritance,
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
        let name = match param.kind() {
            "identifier" => Some(src.text(param)),
            "default_parameter" | "typed_default_parameter" => src.field_text(param, "name"),
            "typed_parameter" | "list_splat_pattern" | "dictionary_splat_pattern" => {
                first_identifier(src, param)
            }
            _ => None,
        };
        if let Some(name) = name.filter(|n| !n.is_empty()) {
            names.push(name.to_string());
        }
    }
    names
}

fn first_identifier<'a>(src: &ParsedSource<'a>, node: Node<'_>) -> Option<&'a str> {
    let mut found = None;
    treesitter::visit(node, &mut |n| {
        if found.is_none() && n.kind() == "identifier" {
            found = Some(src.text(n));
        }
    });
    found
}

/// Decorators applied to a definition, without `@` or call arguments
fn decorators(src: &ParsedSource<'_>, def: Node<'_>) -> Vec<String> {
    let Some(parent) = def.parent().filter(|p| p.kind() == "decorated_definition") else {
        return Vec::new();
    };

    let mut names = Vec::new();
    let mut cursor = parent.walk();
    for child in parent.named_children(&mut cursor) {
        if child.kind() != "decorator" {
            continue;
        }
        let text = src.text(child).trim_start_matches('@').trim();
        let name = text.split('(').next().unwrap_or(text).trim();
        if !name.is_empty() {
            names.push(name.to_string());
        }
    }
    names
}

fn bases(src: &ParsedSource<'_>, class: Node<'_>) -> Vec<String> {
    let Some(args) = class.child_by_field_name("superclasses") else {
        return Vec::new();
    };
    let mut cursor = args.walk();
    let bases = args
        .named_children(&mut cursor)
        .filter(|n| matches!(n.kind(), "identifier" | "attribute" | "subscript"))
        .map(|n| src.text(n).to_string())
        .collect();
    bases
}

/// Names of functions defined directly in a class body
fn methods(src: &ParsedSource<'_>, body: Node<'_>) -> Vec<String> {
    let mut names = Vec::new();
    let mut cursor = body.walk();
    for child in body.named_children(&mut cursor) {
        let def = match child.kind() {
            "function_definition" => Some(child),
            "decorated_definition" => child
                .child_by_field_name("definition")
                .filter(|d| d.kind() == "function_definition"),
            _ => None,
        };
        if let Some(name) = def.and_then(|d| src.field_text(d, "name")) {
            names.push(name.to_string());
        }
    }
    names
}

/// Module path of a `dotted_name` or `aliased_import`
fn imported_path<'a>(src: &ParsedSource<'a>, node: Node<'_>) -> &'a str {
    if node.kind() == "aliased_import" {
        src.field_text(node, "name").unwrap_or_default()
    } else {
        src.text(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::tests::record;

    fn analyze(src: &str) -> FileAnalysis {
        PythonStrategy.analyze(src, &record("mod.py")).unwrap()
    }

    #[test]
    fn test_functions_and_decorators() {
        let analysis = analyze(
            r#"
import os
from typing import List, Optional as Opt

@app.route("/")
@cached
async def handler(request, *args, limit: int = 5, **kwargs):
    return helper(request)

def helper(x):
    pass
"#,
        );

        assert!(analysis.analysis_errors.is_empty(), "{:?}", analysis.analysis_errors);
        assert_eq!(analysis.functions.len(), 2);

        let handler = &analysis.functions[0];
        assert_eq!(handler.name, "handler");
        assert!(handler.is_async);
        assert_eq!(handler.parameters, vec!["request", "args", "limit", "kwargs"]);
        assert_eq!(handler.decorators, vec!["app.route", "cached"]);
        assert_eq!(handler.line_start, 7);
        assert_eq!(handler.line_end, 8);

        assert_eq!(analysis.imports.len(), 2);
        assert_eq!(analysis.imports[0].module, "os");
        assert_eq!(analysis.imports[1].import_type, ImportKind::From);
        assert_eq!(analysis.imports[1].imported_names, vec!["List", "Optional"]);

        let specific = &analysis.language_specific["python"];
        assert_eq!(specific["async_functions"], json!(["handler"]));
        assert_eq!(specific["decorators"], json!(["app.route", "cached"]));
    }

    #[test]
    fn test_classes() {
        let analysis = analyze(
            r#"
class Base:
    pass

class Service(Base, Mixin):
    def start(self):
        pass

    @property
    def name(self):
        return "svc"
"#,
        );

        assert_eq!(analysis.classes.len(), 2);
        let service = &analysis.classes[1];
        assert_eq!(service.name, "Service");
        assert_eq!(service.inherits_from.as_deref(), Some("Base"));
        assert_eq!(service.methods, vec!["start", "name"]);
        assert_eq!(
            analysis.language_specific["python"]["class_inheritance"]["Service"],
            json!(["Base", "Mixin"])
        );
    }

    #[test]
    fn test_unterminated_definition() {
        let analysis = analyze("def broken(\n    return 1\n");
        assert!(analysis.functions.is_empty());
        assert!(analysis.classes.is_empty());
        assert!(analysis.has_errors());
    }

    #[test]
    fn test_error_elsewhere_keeps_good_definitions() {
        let analysis = analyze("def good(a):\n    return a\n\nx = (1,\n");
        assert_eq!(analysis.functions.len(), 1);
        assert_eq!(analysis.functions[0].name, "good");
        assert!(analysis.has_errors());
    }

    #[test]
    fn test_wildcard_import() {
        let analysis = analyze("from pkg.sub import *\n");
        assert_eq!(analysis.imports[0].module, "pkg.sub");
        assert_eq!(analysis.imports[0].imported_names, vec!["*"]);
    }
}
