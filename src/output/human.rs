//! Human-readable output formatting

use crate::index::{FileSymbols, SymbolMatch, ValidationReport};

/// Format search hits, one per line as `path:start-end  kind name`
pub fn format_matches(query: &str, matches: &[SymbolMatch]) -> String {
    if matches.is_empty() {
        return format!("No symbols found for '{}'\n", query);
    }

    let mut output = format!("Found {} symbols for '{}'\n\n", matches.len(), query);
    for (i, m) in matches.iter().enumerate() {
        output.push_str(&format!(
            "{}. {}:{}-{}  {} {}\n",
            i + 1,
            m.file_path,
            m.line_start,
            m.line_end,
            m.kind.as_str(),
            m.name
        ));
    }
    output
}

/// Format the declarations of one file, grouped by kind
pub fn format_symbols(symbols: &FileSymbols) -> String {
    let mut output = format!("{} ({})\n", symbols.path, symbols.language);

    if !symbols.classes.is_empty() {
        output.push_str("\nClasses:\n");
        for class in &symbols.classes {
            let base = class
                .inherits_from
                .as_deref()
                .map(|b| format!(" ({})", b))
                .unwrap_or_default();
            output.push_str(&format!(
                "  {}{}  [{}-{}]\n",
                class.name, base, class.line_start, class.line_end
            ));
            for method in &class.methods {
                output.push_str(&format!("    .{}\n", method));
            }
        }
    }

    if !symbols.functions.is_empty() {
        output.push_str("\nFunctions:\n");
        for func in &symbols.functions {
            let prefix = if func.is_async { "async " } else { "" };
            output.push_str(&format!(
                "  {}{}({})  [{}-{}]\n",
                prefix,
                func.name,
                func.parameters.join(", "),
                func.line_start,
                func.line_end
            ));
            if !func.called_by.is_empty() {
                output.push_str(&format!("    called by: {}\n", func.called_by.join(", ")));
            }
        }
    }

    if !symbols.imports.is_empty() {
        output.push_str("\nImports:\n");
        for import in &symbols.imports {
            output.push_str(&format!("  {}  (line {})\n", import.module, import.line_number));
        }
    }

    output
}

/// Format a validation report
pub fn format_report(report: &ValidationReport) -> String {
    let mut output = if report.is_valid() {
        "Index is valid\n".to_string()
    } else {
        format!("Index has {} errors\n", report.errors.len())
    };
    for error in &report.errors {
        output.push_str(&format!("  error: {}\n", error));
    }
    for warning in &report.warnings {
        output.push_str(&format!("  warning: {}\n", warning));
    }
    output
}
