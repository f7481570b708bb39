//! JavaScript / TypeScript strategy (tree-sitter)
//!
//! One implementation serves three grammars: JavaScript, TypeScript and
//! TSX. They share node names for everything extracted here.
//!
//! @module strategy/javascript

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};
use tree_sitter::Node;

use super::treesitter::{self, header_broken, has_keyword_child, line_end, line_start, unquote, ParsedSource};
use super::{run_steps, ExtractError, ParsingStrategy, StepExtractor};
use crate::index::types::{ClassSymbol, FileAnalysis, FileRecord, FunctionSymbol, ImportKind, ImportRecord};

static EXTENDS: Lazy<Regex> = Lazy::new(|| Regex::new(r"extends\s+([\w.$]+)").unwrap());

const FUNCTION_KINDS: &[&str] = &[
    "function_declaration",
    "generator_function_declaration",
    "method_definition",
    "variable_declarator",
];

const CLASS_KINDS: &[&str] = &["class_declaration", "abstract_class_declaration"];

pub struct JavaScriptStrategy {
    language: &'static str,
    grammar: &'static str,
    extensions: &'static [&'static str],
}

impl JavaScriptStrategy {
    pub fn javascript() -> Self {
        Self {
            language: "javascript",
            grammar: "javascript",
            extensions: &[".js", ".jsx", ".mjs", ".cjs"],
        }
    }

    pub fn typescript() -> Self {
        Self {
            language: "typescript",
            grammar: "typescript",
            extensions: &[".ts", ".mts", ".cts"],
        }
    }

    pub fn tsx() -> Self {
        Self {
            language: "typescript",
            grammar: "tsx",
            extensions: &[".tsx"],
        }
    }
}

impl ParsingStrategy for JavaScriptStrategy {
    fn language(&self) -> &'static str {
        self.language
    }

    fn extensions(&self) -> &'static [&'static str] {
        self.extensions
    }

    fn analyze(&self, content: &str, file: &FileRecord) -> Result<FileAnalysis, ExtractError> {
        let parsed = treesitter::parse(self.grammar, content)?;
        let mut analysis = run_steps(self, &parsed, self.language, file);
        analysis.analysis_errors.extend(parsed.syntax_errors());
        Ok(analysis)
    }
}

impl StepExtractor for JavaScriptStrategy {
    type Source<'a> = ParsedSource<'a>;

    fn functions(&self, src: &ParsedSource<'_>) -> Result<Vec<FunctionSymbol>, ExtractError> {
        Ok(function_nodes(src)
            .into_iter()
            .map(|f| {
                let mut func = FunctionSymbol::new(f.name, line_start(f.node), line_end(f.node));
                func.parameters = f
                    .params
                    .map(|p| parameters(src, p))
                    .unwrap_or_default();
                func.is_async = has_keyword_child(f.body_owner, "async");
                func.decorators = decorators(src, f.node);
                func
            })
            .collect())
    }

    fn classes(&self, src: &ParsedSource<'_>) -> Result<Vec<ClassSymbol>, ExtractError> {
        let mut classes = Vec::new();
        for node in src.nodes_of_kind(CLASS_KINDS) {
            if header_broken(node, &["name", "body"]) {
                continue;
            }
            let mut class = ClassSymbol::new(
                src.field_text(node, "name").unwrap_or_default(),
                line_start(node),
                line_end(node),
            );
            class.inherits_from = heritage(src, node);
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

        for node in src.nodes_of_kind(&["import_statement", "call_expression"]) {
            if node.has_error() {
                continue;
            }
            if node.kind() == "import_statement" {
                let Some(source) = src.field_text(node, "source") else {
                    continue;
                };
                let mut record = ImportRecord::new(unquote(source), ImportKind::Import, line_start(node));
                record.imported_names = import_names(src, node);
                imports.push(record);
            } else if let Some(module) = require_target(src, node) {
                imports.push(ImportRecord::new(module, ImportKind::Require, line_start(node)));
            }
        }

        Ok(imports)
    }

    fn language_specific(&self, src: &ParsedSource<'_>) -> Result<Value, ExtractError> {
        let mut arrow_functions = Vec::new();
        let mut async_functions = Vec::new();

        for f in function_nodes(src) {
            if f.body_owner.kind() == "arrow_function" {
                arrow_functions.push(f.name.to_string());
            }
            if has_keyword_child(f.body_owner, "async") {
                async_functions.push(f.name.to_string());
            }
        }

        let mut exports = Vec::new();
        for node in src.nodes_of_kind(&["export_statement"]) {
            exports.extend(exported_names(src, node));
        }

        Ok(json!({
            "arrow_functions": arrow_functions,
            "async_functions": async_functions,
            "exports": exports,
        }))
    }
}

// =============================================================================
// FUNCTION DISCOVERY
// =============================================================================

/// A function-like declaration located in the tree
struct FoundFunction<'t, 'a> {
    name: &'a str,
    /// Node whose span defines the symbol's lines
    node: Node<'t>,
    /// Node carrying `async` and the parameter list (differs for `const f = () => ...`)
    body_owner: Node<'t>,
    params: Option<Node<'t>>,
}

fn function_nodes<'t, 'a>(src: &'t ParsedSource<'a>) -> Vec<FoundFunction<'t, 'a>> {
    let mut found = Vec::new();

    for node in src.nodes_of_kind(FUNCTION_KINDS) {
        if node.kind() == "variable_declarator" {
            let Some(value) = node
                .child_by_field_name("value")
                .filter(|v| matches!(v.kind(), "arrow_function" | "function_expression" | "function"))
            else {
                continue;
            };
            if header_broken(node, &["name"]) || header_broken(value, &["body"]) {
                continue;
            }
            let name = src.field_text(node, "name").unwrap_or_default();
            // `const { a, b } = ...` has no single name
            if node.child_by_field_name("name").map(|n| n.kind()) != Some("identifier") {
                continue;
            }
            // Span the whole declaration statement when there is one
            let span = node
                .parent()
                .filter(|p| matches!(p.kind(), "lexical_declaration" | "variable_declaration"))
                .unwrap_or(node);
            found.push(FoundFunction {
                name,
                node: span,
                body_owner: value,
                params: value
                    .child_by_field_name("parameters")
                    .or_else(|| value.child_by_field_name("parameter")),
            });
            continue;
        }

        if header_broken(node, &["name", "body"]) {
            continue;
        }
        found.push(FoundFunction {
            name: src.field_text(node, "name").unwrap_or_default(),
            node,
            body_owner: node,
            params: node.child_by_field_name("parameters"),
        });
    }

    found
}

fn parameters(src: &ParsedSource<'_>, params: Node<'_>) -> Vec<String> {
    // Single bare arrow parameter: `x => x * 2`
    if params.kind() == "identifier" {
        return vec![src.text(params).to_string()];
    }

    let mut names = Vec::new();
    let mut cursor = params.walk();
    for param in params.named_children(&mut cursor) {
        let name_node = match param.kind() {
            "identifier" => Some(param),
            "required_parameter" | "optional_parameter" => param.child_by_field_name("pattern"),
            "assignment_pattern" => param.child_by_field_name("left"),
            "rest_pattern" => param.named_child(0),
            _ => None,
        };
        let name_node = name_node.map(|n| match n.kind() {
            "rest_pattern" => n.named_child(0).unwrap_or(n),
            _ => n,
        });
        if let Some(n) = name_node.filter(|n| n.kind() == "identifier") {
            names.push(src.text(n).to_string());
        }
    }
    names
}

fn decorators(src: &ParsedSource<'_>, node: Node<'_>) -> Vec<String> {
    let mut names = Vec::new();
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if child.kind() == "decorator" {
            let text = src.text(child).trim_start_matches('@').trim();
            names.push(text.split('(').next().unwrap_or(text).trim().to_string());
        }
    }
    names
}

// =============================================================================
// CLASSES
// =============================================================================

fn heritage(src: &ParsedSource<'_>, class: Node<'_>) -> Option<String> {
    let mut cursor = class.walk();
    let clause = class
        .named_children(&mut cursor)
        .find(|c| c.kind() == "class_heritage")?;
    EXTENDS
        .captures(src.text(clause))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

fn methods(src: &ParsedSource<'_>, body: Node<'_>) -> Vec<String> {
    let mut names = Vec::new();
    let mut cursor = body.walk();
    for member in body.named_children(&mut cursor) {
        if member.kind() == "method_definition" {
            if let Some(name) = src.field_text(member, "name") {
                names.push(name.to_string());
            }
        }
    }
    names
}

// =============================================================================
// IMPORTS / EXPORTS
// =============================================================================

fn import_names(src: &ParsedSource<'_>, import: Node<'_>) -> Vec<String> {
    let mut names = Vec::new();
    let mut cursor = import.walk();
    let Some(clause) = import
        .named_children(&mut cursor)
        .find(|c| c.kind() == "import_clause")
    else {
        return names;
    };

    treesitter::visit(clause, &mut |node| match node.kind() {
        "import_specifier" => {
            if let Some(name) = src.field_text(node, "name") {
                names.push(name.to_string());
            }
        }
        "namespace_import" => names.push("*".to_string()),
        "identifier" if node.parent().map(|p| p.id()) == Some(clause.id()) => {
            names.push(src.text(node).to_string());
        }
        _ => {}
    });
    names
}

/// `require('x')` target
fn require_target<'a>(src: &ParsedSource<'a>, call: Node<'_>) -> Option<&'a str> {
    let function = call.child_by_field_name("function")?;
    if src.text(function) != "require" {
        return None;
    }
    let args = call.child_by_field_name("arguments")?;
    let first = args.named_child(0).filter(|a| a.kind() == "string")?;
    Some(unquote(src.text(first)))
}

fn exported_names(src: &ParsedSource<'_>, export: Node<'_>) -> Vec<String> {
    if let Some(decl) = export.child_by_field_name("declaration") {
        if let Some(name) = src.field_text(decl, "name") {
            return vec![name.to_string()];
        }
        let mut names = Vec::new();
        let mut cursor = decl.walk();
        for declarator in decl.named_children(&mut cursor) {
            if declarator.kind() == "variable_declarator" {
                if let Some(name) = src.field_text(declarator, "name") {
                    names.push(name.to_string());
                }
            }
        }
        return names;
    }

    let mut names = Vec::new();
    treesitter::visit(export, &mut |node| {
        if node.kind() == "export_specifier" {
            let exported = src
                .field_text(node, "alias")
                .or_else(|| src.field_text(node, "name"));
            if let Some(name) = exported {
                names.push(name.to_string());
            }
        }
    });
    if names.is_empty() && src.text(export).trim_start().starts_with("export default") {
        names.push("default".to_string());
    }
    names
}
