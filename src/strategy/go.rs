//! Go strategy (tree-sitter)
//!
//! Struct and interface types are the class-like symbols; a struct's
//! methods are the method declarations whose receiver names it.
//!
//! @module strategy/go

use std::collections::BTreeMap;

use serde_json::{json, Value};
use tree_sitter::Node;

use super::treesitter::{self, header_broken, line_end, line_start, unquote, ParsedSource};
use super::{run_steps, ExtractError, ParsingStrategy, StepExtractor};
use crate::index::types::{ClassSymbol, FileAnalysis, FileRecord, FunctionSymbol, ImportKind, ImportRecord};

const FUNCTION_QUERY: &str = "(function_declaration) @function\n(method_declaration) @function";

pub struct GoStrategy;

impl ParsingStrategy for GoStrategy {
    fn language(&self) -> &'static str {
        "go"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".go"]
    }

    fn analyze(&self, content: &str, file: &FileRecord) -> Result<FileAnalysis, ExtractError> {
        let parsed = treesitter::parse("go", content)?;
        let mut analysis = run_steps(self, &parsed, self.language(), file);
        analysis.analysis_errors.extend(parsed.syntax_errors());
        Ok(analysis)
    }
}

impl StepExtractor for GoStrategy {
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
            functions.push(func);
        }
        Ok(functions)
    }

    fn classes(&self, src: &ParsedSource<'_>) -> Result<Vec<ClassSymbol>, ExtractError> {
        let receivers = methods_by_receiver(src)?;
        let mut classes = Vec::new();

        for (spec, kind) in type_specs(src) {
            let name = src.field_text(spec, "name").unwrap_or_default();
            let mut class = ClassSymbol::new(name, line_start(spec), line_end(spec));
            class.methods = match kind {
                "struct_type" => receivers.get(name).cloned().unwrap_or_default(),
                _ => interface_methods(src, spec),
            };
            classes.push(class);
        }
        Ok(classes)
    }

    fn imports(&self, src: &ParsedSource<'_>) -> Result<Vec<ImportRecord>, ExtractError> {
        let mut imports = Vec::new();
        for spec in src.nodes_of_kind(&["import_spec"]) {
            if spec.has_error() {
                continue;
            }
            let Some(path) = src.field_text(spec, "path") else {
                continue;
            };
            let mut record = ImportRecord::new(unquote(path), ImportKind::Import, line_start(spec));
            if let Some(alias) = src.field_text(spec, "name") {
                record.imported_names.push(alias.to_string());
            }
            imports.push(record);
        }
        Ok(imports)
    }

    fn language_specific(&self, src: &ParsedSource<'_>) -> Result<Value, ExtractError> {
        let struct_methods = methods_by_receiver(src)?;

        let interfaces: Vec<&str> = type_specs(src)
            .into_iter()
            .filter(|(_, kind)| *kind == "interface_type")
            .map(|(spec, _)| src.field_text(spec, "name").unwrap_or_default())
            .collect();

        let goroutines: Vec<u32> = src
            .nodes_of_kind(&["go_statement"])
            .into_iter()
            .map(line_start)
            .collect();

        Ok(json!({
            "struct_methods": struct_methods,
            "interfaces": interfaces,
            "goroutines": goroutines,
        }))
    }
}

// =============================================================================
// HELPERS
// =============================================================================

/// `type X struct {...}` / `type X interface {...}` specs with their type kind
fn type_specs<'t>(src: &'t ParsedSource<'_>) -> Vec<(Node<'t>, &'static str)> {
    src.nodes_of_kind(&["type_spec"])
        .into_iter()
        .filter(|spec| !header_broken(*spec, &["name", "type"]))
        .filter_map(|spec| {
            let kind = spec.child_by_field_name("type")?.kind();
            matches!(kind, "struct_type" | "interface_type").then_some((spec, kind))
        })
        .collect()
}

/// Receiver type name -> method names, in declaration order
fn methods_by_receiver(src: &ParsedSource<'_>) -> Result<BTreeMap<String, Vec<String>>, ExtractError> {
    let mut map: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for node in src.query_nodes("(method_declaration) @method", "method")? {
        if header_broken(node, &["name", "receiver"]) {
            continue;
        }
        let Some(receiver) = node.child_by_field_name("receiver").and_then(|r| receiver_type(src, r)) else {
            continue;
        };
        let name = src.field_text(node, "name").unwrap_or_default();
        map.entry(receiver).or_default().push(name.to_string());
    }
    Ok(map)
}

/// `(s *Server)` -> `Server`, `(l List[T])` -> `List`
fn receiver_type(src: &ParsedSource<'_>, receiver: Node<'_>) -> Option<String> {
    let mut cursor = receiver.walk();
    let decl = receiver
        .named_children(&mut cursor)
        .find(|c| c.kind() == "parameter_declaration")?;
    let text = src.field_text(decl, "type")?;
    let name = text.trim_start_matches('*');
    let name = name.split('[').next().unwrap_or(name).trim();
    (!name.is_empty()).then(|| name.to_string())
}

fn interface_methods(src: &ParsedSource<'_>, spec: Node<'_>) -> Vec<String> {
    let mut names = Vec::new();
    if let Some(body) = spec.child_by_field_name("type") {
        treesitter::visit(body, &mut |node| {
            if matches!(node.kind(), "method_elem" | "method_spec") {
                if let Some(name) = src.field_text(node, "name") {
                    names.push(name.to_string());
                }
            }
        });
    }
    names
}

fn parameters(src: &ParsedSource<'_>, list: Node<'_>) -> Vec<String> {
    let mut names = Vec::new();
    let mut cursor = list.walk();
    for decl in list.named_children(&mut cursor) {
        if !matches!(decl.kind(), "parameter_declaration" | "variadic_parameter_declaration") {
            continue;
        }
        let mut inner = decl.walk();
        for name in decl.children_by_field_name("name", &mut inner) {
            names.push(src.text(name).to_string());
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::tests::record;

    const SRC: &str = r#"package server

import (
	"fmt"
	log "github.com/sirupsen/logrus"
)

type Handler interface {
	Serve(req string) error
}

type Server struct {
	addr string
}

func NewServer(addr string, opts ...int) *Server {
	return &Server{addr: addr}
}

func (s *Server) Start(port, backlog int) {
	go s.loop()
	fmt.Println("started")
}

func (s *Server) loop() {}
"#;

    #[test]
    fn test_go_symbols() {
        let analysis = GoStrategy.analyze(SRC, &record("server.go")).unwrap();
        assert!(analysis.analysis_errors.is_empty(), "{:?}", analysis.analysis_errors);

        let names: Vec<_> = analysis.functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["NewServer", "Start", "loop"]);
        assert_eq!(analysis.functions[0].parameters, vec!["addr", "opts"]);
        assert_eq!(analysis.functions[1].parameters, vec!["port", "backlog"]);

        assert_eq!(analysis.classes.len(), 2);
        assert_eq!(analysis.classes[0].name, "Handler");
        assert_eq!(analysis.classes[0].methods, vec!["Serve"]);
        assert_eq!(analysis.classes[1].name, "Server");
        assert_eq!(analysis.classes[1].methods, vec!["Start", "loop"]);

        assert_eq!(analysis.imports.len(), 2);
        assert_eq!(analysis.imports[1].module, "github.com/sirupsen/logrus");
        assert_eq!(analysis.imports[1].imported_names, vec!["log"]);
    }

    #[test]
    fn test_go_language_specific() {
        let analysis = GoStrategy.analyze(SRC, &record("server.go")).unwrap();
        let specific = &analysis.language_specific["go"];
        assert_eq!(specific["struct_methods"]["Server"], json!(["Start", "loop"]));
        assert_eq!(specific["interfaces"], json!(["Handler"]));
        assert_eq!(specific["goroutines"], json!([21]));
    }
}
