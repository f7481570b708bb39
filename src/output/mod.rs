//! Output formatting for CLI results

pub mod human;
pub mod json;

use crate::index::{FileSymbols, SymbolMatch, ValidationReport};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
}

impl OutputFormat {
    pub fn from_json_flag(json: bool) -> Self {
        if json {
            Self::Json
        } else {
            Self::Human
        }
    }
}

/// Format search hits
pub fn format_matches(query: &str, matches: &[SymbolMatch], format: OutputFormat) -> String {
    match format {
        OutputFormat::Human => human::format_matches(query, matches),
        OutputFormat::Json => json::format(matches),
    }
}

/// Format the declarations of one file
pub fn format_symbols(symbols: &FileSymbols, format: OutputFormat) -> String {
    match format {
        OutputFormat::Human => human::format_symbols(symbols),
        OutputFormat::Json => json::format(symbols),
    }
}

/// Format a validation report
pub fn format_report(report: &ValidationReport, format: OutputFormat) -> String {
    match format {
        OutputFormat::Human => human::format_report(report),
        OutputFormat::Json => json::format(report),
    }
}
