//! Tree-sitter Support
//!
//! Parser construction, node helpers and syntax-error collection shared by
//! the structured strategies. A file is parsed once; every extraction step
//! reads the same tree.
//!
//! @module strategy/treesitter

use streaming_iterator::StreamingIterator;
use tree_sitter::{Language, Node, Parser, Query, QueryCursor, Tree};

use super::ExtractError;

// =============================================================================
// LANGUAGE PARSERS
// =============================================================================

/// Get tree-sitter language for the given language name
pub fn get_language(language: &str) -> Result<Language, ExtractError> {
    match language {
        "typescript" => Ok(tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()),
        "tsx" => Ok(tree_sitter_typescript::LANGUAGE_TSX.into()),
        "javascript" => Ok(tree_sitter_javascript::LANGUAGE.into()),
        "python" => Ok(tree_sitter_python::LANGUAGE.into()),
        "rust" => Ok(tree_sitter_rust::LANGUAGE.into()),
        "go" => Ok(tree_sitter_go::LANGUAGE.into()),
        _ => Err(ExtractError::UnsupportedLanguage {
            language: language.to_string(),
        }),
    }
}

/// Parse source with the named grammar
pub fn parse<'a>(grammar: &str, source: &'a str) -> Result<ParsedSource<'a>, ExtractError> {
    let language = get_language(grammar)?;
    let mut parser = Parser::new();
    parser
        .set_language(&language)
        .map_err(|e| ExtractError::ParseFailed {
            language: grammar.to_string(),
            message: e.to_string(),
        })?;

    let tree = parser
        .parse(source, None)
        .ok_or_else(|| ExtractError::ParseFailed {
            language: grammar.to_string(),
            message: "parser returned no tree".to_string(),
        })?;

    Ok(ParsedSource {
        grammar: grammar.to_string(),
        language,
        tree,
        source,
    })
}

// =============================================================================
// PARSED SOURCE
// =============================================================================

/// A syntax tree together with the text it was parsed from
pub struct ParsedSource<'a> {
    grammar: String,
    language: Language,
    tree: Tree,
    source: &'a str,
}

impl<'a> ParsedSource<'a> {
    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    /// Text covered by a node (empty on invalid UTF-8 boundaries)
    pub fn text(&self, node: Node<'_>) -> &'a str {
        node.utf8_text(self.source.as_bytes()).unwrap_or("")
    }

    /// Text of a named field child
    pub fn field_text(&self, node: Node<'_>, field: &str) -> Option<&'a str> {
        node.child_by_field_name(field).map(|n| self.text(n))
    }

    /// All nodes captured as `@capture` by a query over the whole tree
    pub fn query_nodes(&self, query: &str, capture: &str) -> Result<Vec<Node<'_>>, ExtractError> {
        let query = Query::new(&self.language, query).map_err(|e| ExtractError::ParseFailed {
            language: self.grammar.clone(),
            message: format!("invalid query: {}", e),
        })?;
        let Some(index) = query.capture_index_for_name(capture) else {
            return Ok(Vec::new());
        };

        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&query, self.tree.root_node(), self.source.as_bytes());
        let mut nodes = Vec::new();
        while let Some(m) = matches.next() {
            for cap in m.captures.iter().filter(|c| c.index == index) {
                nodes.push(cap.node);
            }
        }
        nodes.sort_by_key(|n| n.start_byte());
        nodes.dedup_by_key(|n| n.id());
        Ok(nodes)
    }

    /// Named descendants of any of the given kinds, in document order
    pub fn nodes_of_kind(&self, kinds: &[&str]) -> Vec<Node<'_>> {
        let mut found = Vec::new();
        visit(self.tree.root_node(), &mut |node| {
            if kinds.contains(&node.kind()) {
                found.push(node);
            }
        });
        found
    }

    /// One annotation per line holding an ERROR or MISSING node
    pub fn syntax_errors(&self) -> Vec<String> {
        let root = self.tree.root_node();
        if !root.has_error() {
            return Vec::new();
        }

        let mut lines = Vec::new();
        collect_error_lines(root, &mut lines);
        lines.sort_unstable();
        lines.dedup();

        lines
            .into_iter()
            .map(|line| format!("Syntax error at line {}", line))
            .collect()
    }
}

// =============================================================================
// NODE HELPERS
// =============================================================================

/// Preorder walk over named nodes
pub fn visit<'t>(node: Node<'t>, f: &mut impl FnMut(Node<'t>)) {
    f(node);
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        visit(child, f);
    }
}

fn collect_error_lines(node: Node<'_>, lines: &mut Vec<u32>) {
    if node.is_error() || node.is_missing() {
        lines.push(line_start(node));
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.has_error() || child.is_missing() {
            collect_error_lines(child, lines);
        }
    }
}

/// 1-based first line of a node
pub fn line_start(node: Node<'_>) -> u32 {
    node.start_position().row as u32 + 1
}

/// 1-based last line of a node
pub fn line_end(node: Node<'_>) -> u32 {
    node.end_position().row as u32 + 1
}

/// Whether a declaration's header is unusable: the node is itself an error,
/// or one of the given fields is absent, missing or contains an error.
pub fn header_broken(node: Node<'_>, fields: &[&str]) -> bool {
    if node.is_error() || node.is_missing() {
        return true;
    }
    fields.iter().any(|field| match node.child_by_field_name(field) {
        Some(child) => child.is_missing() || child.has_error(),
        None => true,
    })
}

/// Whether an anonymous keyword child (e.g. `async`) is present
pub fn has_keyword_child(node: Node<'_>, keyword: &str) -> bool {
    let mut cursor = node.walk();
    let found = node
        .children(&mut cursor)
        .any(|c| !c.is_named() && c.kind() == keyword);
    found
}

/// Strip matching quotes from a string literal
pub fn unquote(text: &str) -> &str {
    let trimmed = text.trim();
    for quote in ['"', '\'', '`'] {
        if let Some(inner) = trimmed
            .strip_prefix(quote)
            .and_then(|t| t.strip_suffix(quote))
        {
            return inner;
        }
    }
    trimmed
}
