//! Index Validator
//!
//! Checks referential invariants of an assembled (or loaded) index and
//! reports findings. Never fails a build.
//!
//! @module index/validate

use std::collections::{BTreeMap, HashSet};

use serde_json::Value;
use tracing::warn;

use super::registry::SymbolRegistry;
use super::types::{CallerRef, CodeIndex, ValidationReport};

/// Validate an index against its own file set
pub fn validate(index: &CodeIndex) -> ValidationReport {
    let mut report = ValidationReport::default();

    if index.files.is_empty() {
        report.warnings.push("No files in index".to_string());
    }

    let version = index.index_metadata.version;
    if !version.is_current() {
        report
            .warnings
            .push(format!("Index version {} may be outdated", version));
    }

    // File ids and paths
    let mut ids = HashSet::new();
    let mut paths = HashSet::new();
    for file in &index.files {
        if !ids.insert(file.file.id) {
            report.errors.push(format!("Duplicate file ID: {}", file.file.id));
        }
        if !paths.insert(file.file.path.as_str()) {
            report.errors.push(format!("Duplicate file path: {}", file.file.path));
        }
    }

    // Forward lookups
    for (path, id) in &index.lookups.path_to_id {
        if !ids.contains(id) {
            report.errors.push(format!(
                "Lookup references non-existent file ID: {} for path {}",
                id, path
            ));
        }
    }
    check_id_table(&mut report, "Function", &index.lookups.function_to_file_id, &ids);
    check_id_table(&mut report, "Class", &index.lookups.class_to_file_id, &ids);

    report.merge(check_against_declarations(index));

    // Reverse lookups
    let reverse = &index.reverse_lookups;
    check_callers(&mut report, "function_callers", &reverse.function_callers, &ids);
    check_callers(&mut report, "class_instantiators", &reverse.class_instantiators, &ids);
    for (module, importers) in &reverse.imports_module {
        for id in importers.iter().filter(|id| !ids.contains(*id)) {
            report.errors.push(format!(
                "Import of '{}' references non-existent file ID: {}",
                module, id
            ));
        }
    }

    report
}

fn check_id_table(
    report: &mut ValidationReport,
    kind: &str,
    table: &BTreeMap<String, Vec<u32>>,
    ids: &HashSet<u32>,
) {
    for (name, file_ids) in table {
        if file_ids.is_empty() {
            report
                .errors
                .push(format!("{} lookup for '{}' has no file IDs", kind, name));
        }
        for id in file_ids.iter().filter(|id| !ids.contains(*id)) {
            report.errors.push(format!(
                "{} lookup for '{}' references non-existent file ID: {}",
                kind, name, id
            ));
        }
    }
}

/// Compare the persisted name tables with a registry rebuilt from the files
fn check_against_declarations(index: &CodeIndex) -> ValidationReport {
    let mut report = ValidationReport::default();
    let registry = SymbolRegistry::build(&index.files);
    let expected = registry.lookups();

    check_declarations(
        &mut report,
        "Function",
        &index.lookups.function_to_file_id,
        &expected.function_to_file_id,
        |name| registry.first_function_file(name),
    );
    check_declarations(
        &mut report,
        "Class",
        &index.lookups.class_to_file_id,
        &expected.class_to_file_id,
        |name| registry.first_class_file(name),
    );

    report
}

fn check_declarations(
    report: &mut ValidationReport,
    kind: &str,
    actual: &BTreeMap<String, Vec<u32>>,
    expected: &BTreeMap<String, Vec<u32>>,
    first_declared: impl Fn(&str) -> Option<u32>,
) {
    for (name, declared_in) in expected {
        match actual.get(name) {
            None => report
                .errors
                .push(format!("{} '{}' is declared but missing from lookups", kind, name)),
            Some(listed) if listed.len() != declared_in.len() => report.errors.push(format!(
                "{} lookup for '{}' lists {} files but {} declare it",
                kind,
                name,
                listed.len(),
                declared_in.len()
            )),
            Some(listed) => {
                // Single-id consumers read the head of the list
                let first = first_declared(name);
                if listed.first().copied() != first {
                    report.warnings.push(format!(
                        "{} lookup for '{}' starts at file ID {:?} but it is first declared in {:?}",
                        kind,
                        name,
                        listed.first(),
                        first
                    ));
                }
            }
        }
    }
    for name in actual.keys().filter(|n| !expected.contains_key(*n)) {
        report
            .errors
            .push(format!("{} lookup for '{}' has no declaration", kind, name));
    }
}

fn check_callers(
    report: &mut ValidationReport,
    table_name: &str,
    table: &BTreeMap<String, Vec<CallerRef>>,
    ids: &HashSet<u32>,
) {
    for (key, callers) in table {
        for caller in callers.iter().filter(|c| !ids.contains(&c.file_id)) {
            report.errors.push(format!(
                "{} entry '{}' references non-existent file ID: {}",
                table_name, key, caller.file_id
            ));
        }
    }
}

/// Check that the raw function/class lookups are lists of integers.
///
/// Runs against the JSON document before it is deserialized so a malformed
/// document produces a report instead of an opaque decode error.
pub fn validate_lookup_shapes(doc: &Value) -> ValidationReport {
    let mut report = ValidationReport::default();

    for (kind, table) in [("Function", "function_to_file_id"), ("Class", "class_to_file_id")] {
        let Some(entries) = doc.pointer(&format!("/lookups/{}", table)) else {
            continue;
        };
        let Some(entries) = entries.as_object() else {
            report.errors.push(format!("{} lookup table should be an object", kind));
            continue;
        };
        for (name, value) in entries {
            match value.as_array() {
                None => report.errors.push(format!(
                    "{} lookup for '{}' should be a list, got {}",
                    kind,
                    name,
                    json_type(value)
                )),
                Some(items) if !items.iter().all(Value::is_u64) => report.errors.push(format!(
                    "All file IDs in {} lookup for '{}' should be integers",
                    kind.to_lowercase(),
                    name
                )),
                Some(_) => {}
            }
        }
    }

    report
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Log a report at the right levels
pub fn log_report(report: &ValidationReport) {
    for warning in &report.warnings {
        warn!(warning = %warning, "Index validation warning");
    }
    for error in &report.errors {
        warn!(error = %error, "Index validation error");
    }
}
