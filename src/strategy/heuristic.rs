//! Heuristic (regex) extraction helpers
//!
//! Shared by the regex-based strategies: line bookkeeping, block-end
//! estimation, parameter splitting and keyword filtering.
//!
//! @module strategy/heuristic

use once_cell::sync::Lazy;
use regex::Regex;

use crate::index::types::FunctionSymbol;

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z_][A-Za-z0-9_]*").unwrap());
static PAREN_GROUP: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(([^)]*)\)").unwrap());

// =============================================================================
// SOURCE LINES
// =============================================================================

/// File content with precomputed line offsets
pub struct SourceLines<'a> {
    pub content: &'a str,
    pub lines: Vec<&'a str>,
    line_offsets: Vec<usize>,
}

impl<'a> SourceLines<'a> {
    pub fn new(content: &'a str) -> Self {
        let mut line_offsets = vec![0];
        line_offsets.extend(content.match_indices('\n').map(|(i, _)| i + 1));
        Self {
            content,
            lines: content.lines().collect(),
            line_offsets,
        }
    }

    /// 1-based line containing a byte offset
    pub fn line_of(&self, offset: usize) -> u32 {
        match self.line_offsets.binary_search(&offset) {
            Ok(i) => i as u32 + 1,
            Err(i) => i as u32,
        }
    }

    /// 1-based line text
    pub fn line(&self, line: u32) -> &'a str {
        self.lines
            .get(line.saturating_sub(1) as usize)
            .copied()
            .unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Estimated last line of the block opening at `start_line`
    pub fn block_end(&self, start_line: u32) -> u32 {
        estimate_end_line(&self.lines, start_line as usize) as u32
    }
}

// =============================================================================
// BLOCK ESTIMATION
// =============================================================================

/// Estimate the end line of a block starting at 1-based `start_line`.
///
/// Brace counting when the block opens a brace, dedent otherwise, and a
/// 50-line window when neither settles.
pub fn estimate_end_line(lines: &[&str], start_line: usize) -> usize {
    if start_line == 0 || start_line > lines.len() {
        return start_line;
    }

    let start_idx = start_line - 1;
    let start_indent = indent_of(lines[start_idx]);

    let mut brace_count = 0i32;
    let mut found_opening = false;

    for (i, line) in lines.iter().enumerate().skip(start_idx) {
        let trimmed = line.trim();

        for ch in trimmed.chars() {
            match ch {
                '{' => {
                    brace_count += 1;
                    found_opening = true;
                }
                '}' => brace_count -= 1,
                _ => {}
            }
        }

        if found_opening && brace_count <= 0 {
            return i + 1;
        }

        // Declaration without a body: `void f(int);`
        if !found_opening && i == start_idx && trimmed.ends_with(';') {
            return start_line;
        }

        if !found_opening && i > start_idx {
            let current_indent = indent_of(line);
            if !trimmed.is_empty()
                && current_indent <= start_indent
                && !trimmed.starts_with('#')
                && !trimmed.starts_with('{')
            {
                return i.max(start_line);
            }
        }
    }

    (start_line + 50).min(lines.len())
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

// =============================================================================
// PARAMETERS
// =============================================================================

/// How a parameter declaration places its name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamStyle {
    /// `name: Type = default` (generic, scripting languages)
    NameFirst,
    /// `Type name = default` (C family, Java)
    NameLast,
}

/// Parameter names from the first `(...)` group of a declaration
pub fn parameters_in(text: &str, style: ParamStyle) -> Vec<String> {
    PAREN_GROUP
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| split_parameters(m.as_str(), style))
        .unwrap_or_default()
}

/// Split a raw parameter list on top-level commas and keep the names
pub fn split_parameters(raw: &str, style: ParamStyle) -> Vec<String> {
    let mut params = Vec::new();
    let mut depth = 0i32;
    let mut current = String::new();

    for ch in raw.chars() {
        match ch {
            '<' | '(' | '[' | '{' => depth += 1,
            '>' | ')' | ']' | '}' => depth -= 1,
            ',' if depth == 0 => {
                params.extend(parameter_name(&current, style));
                current.clear();
                continue;
            }
            _ => {}
        }
        current.push(ch);
    }
    params.extend(parameter_name(&current, style));
    params
}

fn parameter_name(param: &str, style: ParamStyle) -> Option<String> {
    let param = param.split('=').next().unwrap_or(param).trim();
    if param.is_empty() || param == "void" || param == "..." {
        return None;
    }

    match style {
        ParamStyle::NameFirst => {
            let name = param.split(':').next().unwrap_or(param);
            let name = name.trim().trim_start_matches(['*', '&', '$']);
            is_identifier(name).then(|| name.to_string())
        }
        ParamStyle::NameLast => {
            // Drop array suffixes and generic arguments before taking the last identifier
            let cleaned = strip_brackets(param);
            IDENTIFIER
                .find_iter(&cleaned)
                .last()
                .map(|m| m.as_str().to_string())
                .filter(|name| !is_keyword(name))
        }
    }
}

fn strip_brackets(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut depth = 0i32;
    for ch in text.chars() {
        match ch {
            '<' | '[' => depth += 1,
            '>' | ']' => depth -= 1,
            _ if depth == 0 => out.push(ch),
            _ => {}
        }
    }
    out
}

pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => chars.all(|c| c.is_alphanumeric() || c == '_'),
        _ => false,
    }
}

// =============================================================================
// CLASS MEMBERSHIP
// =============================================================================

/// Functions declared strictly inside a class's line span
pub fn methods_within(functions: &[FunctionSymbol], line_start: u32, line_end: u32) -> Vec<String> {
    functions
        .iter()
        .filter(|f| f.line_start > line_start && f.line_start <= line_end)
        .map(|f| f.name.clone())
        .collect()
}

// =============================================================================
// KEYWORDS
// =============================================================================

/// Check if a name is a common keyword (language-agnostic common keywords only)
pub fn is_keyword(name: &str) -> bool {
    matches!(
        name,
        // Control flow (universal)
        "if" | "else" | "for" | "while" | "do" | "switch" | "case" | "default"
        | "break" | "continue" | "return" | "throw" | "try" | "catch" | "finally"
        // Type/declaration keywords
        | "var" | "let" | "const" | "function" | "class" | "extends" | "implements"
        | "import" | "export" | "from" | "as" | "new" | "delete"
        | "async" | "await" | "yield" | "static" | "typeof" | "sizeof" | "instanceof"
        | "public" | "private" | "protected" | "internal" | "readonly"
        | "true" | "false" | "null" | "undefined" | "void"
        | "this" | "super"
        // Python
        | "def" | "lambda" | "with" | "assert" | "pass" | "raise" | "elif" | "except"
        | "global" | "nonlocal" | "and" | "or" | "not" | "is" | "in"
        | "None" | "True" | "False"
        // Rust
        | "fn" | "pub" | "mod" | "use" | "crate" | "Self"
        | "struct" | "enum" | "trait" | "impl" | "type" | "where"
        | "mut" | "ref" | "move" | "dyn" | "unsafe" | "loop" | "match"
        // Go
        | "func" | "package" | "go" | "defer" | "chan" | "select" | "range" | "interface"
        // C family
        | "union" | "namespace" | "template" | "typedef" | "using" | "operator"
        | "foreach" | "lock" | "fixed" | "checked" | "unchecked" | "synchronized"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_of() {
        let src = SourceLines::new("a\nbb\n\nccc");
        assert_eq!(src.line_of(0), 1);
        assert_eq!(src.line_of(2), 2);
        assert_eq!(src.line_of(5), 3);
        assert_eq!(src.line_of(6), 4);
        assert_eq!(src.line(4), "ccc");
        assert_eq!(src.len(), 4);
    }

    #[test]
    fn test_estimate_end_line_braces() {
        let lines = vec!["int main() {", "  if (x) {", "  }", "}", "int other;"];
        assert_eq!(estimate_end_line(&lines, 1), 4);
        assert_eq!(estimate_end_line(&lines, 2), 3);
    }

    #[test]
    fn test_estimate_end_line_allman_and_prototype() {
        let lines = vec!["void f()", "{", "  g();", "}", "void h(int);"];
        assert_eq!(estimate_end_line(&lines, 1), 4);
        assert_eq!(estimate_end_line(&lines, 5), 5);
    }

    #[test]
    fn test_estimate_end_line_indentation() {
        let lines = vec!["def f():", "    x = 1", "", "    return x", "def g():"];
        assert_eq!(estimate_end_line(&lines, 1), 4);
        assert_eq!(estimate_end_line(&lines, 5), 5);
    }

    #[test]
    fn test_split_parameters() {
        assert_eq!(
            split_parameters("Map<String, Integer> counts, final int[] xs", ParamStyle::NameLast),
            vec!["counts", "xs"]
        );
        assert_eq!(
            split_parameters("const char *name, int n = 3", ParamStyle::NameLast),
            vec!["name", "n"]
        );
        assert_eq!(split_parameters("void", ParamStyle::NameLast), Vec::<String>::new());
        assert_eq!(
            split_parameters("a, b: int = 2, *rest", ParamStyle::NameFirst),
            vec!["a", "b", "rest"]
        );
        assert_eq!(parameters_in("def f(x, y):", ParamStyle::NameFirst), vec!["x", "y"]);
    }

    #[test]
    fn test_methods_within() {
        let fns = vec![
            FunctionSymbol::new("outer", 1, 2),
            FunctionSymbol::new("inner", 4, 5),
            FunctionSymbol::new("after", 9, 10),
        ];
        assert_eq!(methods_within(&fns, 3, 8), vec!["inner"]);
    }

    #[test]
    fn test_is_keyword() {
        assert!(is_keyword("if"));
        assert!(is_keyword("sizeof"));
        assert!(!is_keyword("helper"));
    }
}
