//! Code Index Data Model
//!
//! Every structure here is part of the persisted document. Field names are
//! the wire names; changing one is a schema change (see `schema.rs`).
//!
//! @module index/types

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::schema::SchemaVersion;

// =============================================================================
// FILE RECORDS
// =============================================================================

/// A discovered source file. `id` is the join key for every other table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: u32,
    /// Project-relative, `/`-separated
    pub path: String,
    pub size: u64,
    pub modified_time: DateTime<Utc>,
    /// Lowercase with leading dot, e.g. `.py`
    pub extension: String,
    pub language: String,
}

// =============================================================================
// SYMBOLS
// =============================================================================

/// A function or method declaration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionSymbol {
    pub name: String,
    pub parameters: Vec<String>,
    pub line_start: u32,
    pub line_end: u32,
    pub line_count: u32,
    pub is_async: bool,
    pub decorators: Vec<String>,
    /// Qualified names of resolved callees
    pub calls: Vec<String>,
    /// Qualified names of resolved callers
    pub called_by: Vec<String>,
}

impl FunctionSymbol {
    pub fn new(name: impl Into<String>, line_start: u32, line_end: u32) -> Self {
        let line_end = line_end.max(line_start);
        Self {
            name: name.into(),
            line_start,
            line_end,
            line_count: line_end - line_start + 1,
            ..Default::default()
        }
    }
}

/// A class-like declaration (class, struct, interface)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassSymbol {
    pub name: String,
    pub line_start: u32,
    pub line_end: u32,
    pub line_count: u32,
    pub methods: Vec<String>,
    /// First base only
    pub inherits_from: Option<String>,
    /// Qualified names of functions that appear to construct this class
    pub instantiated_by: Vec<String>,
}

impl ClassSymbol {
    pub fn new(name: impl Into<String>, line_start: u32, line_end: u32) -> Self {
        let line_end = line_end.max(line_start);
        Self {
            name: name.into(),
            line_start,
            line_end,
            line_count: line_end - line_start + 1,
            ..Default::default()
        }
    }
}

/// Syntactic form an import was written in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportKind {
    Import,
    From,
    Include,
    Require,
    Use,
    Using,
}

impl ImportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Import => "import",
            Self::From => "from",
            Self::Include => "include",
            Self::Require => "require",
            Self::Use => "use",
            Self::Using => "using",
        }
    }
}

/// An import statement, recorded verbatim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRecord {
    pub module: String,
    pub imported_names: Vec<String>,
    pub import_type: ImportKind,
    pub line_number: u32,
}

impl ImportRecord {
    pub fn new(module: impl Into<String>, import_type: ImportKind, line_number: u32) -> Self {
        Self {
            module: module.into(),
            imported_names: Vec::new(),
            import_type,
            line_number,
        }
    }
}

/// Kind of symbol, used by queries and statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Function,
    Class,
    Import,
}

impl SymbolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Function => "function",
            Self::Class => "class",
            Self::Import => "import",
        }
    }
}

impl std::str::FromStr for SymbolKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "function" | "fn" | "method" => Ok(Self::Function),
            "class" | "struct" | "type" => Ok(Self::Class),
            "import" | "module" => Ok(Self::Import),
            other => Err(format!("unknown symbol kind '{}'", other)),
        }
    }
}

// =============================================================================
// PER-FILE ANALYSIS
// =============================================================================

/// Everything extracted from one file. This is also the record shape stored
/// in `CodeIndex::files`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileAnalysis {
    #[serde(flatten)]
    pub file: FileRecord,
    pub line_count: u32,
    pub functions: Vec<FunctionSymbol>,
    pub classes: Vec<ClassSymbol>,
    pub imports: Vec<ImportRecord>,
    /// Keyed by language name
    pub language_specific: BTreeMap<String, Value>,
    pub analysis_errors: Vec<String>,
}

impl FileAnalysis {
    /// Empty, well-formed result for a file
    pub fn new(file: FileRecord) -> Self {
        Self {
            file,
            line_count: 0,
            functions: Vec::new(),
            classes: Vec::new(),
            imports: Vec::new(),
            language_specific: BTreeMap::new(),
            analysis_errors: Vec::new(),
        }
    }

    /// Empty result annotated with the reasons analysis could not run
    pub fn failed(file: FileRecord, errors: Vec<String>) -> Self {
        Self {
            analysis_errors: errors,
            ..Self::new(file)
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.analysis_errors.is_empty()
    }
}

// =============================================================================
// LOOKUPS
// =============================================================================

/// Forward lookup tables. The id lists are the authoritative duplicate source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lookups {
    pub path_to_id: BTreeMap<String, u32>,
    pub function_to_file_id: BTreeMap<String, Vec<u32>>,
    pub class_to_file_id: BTreeMap<String, Vec<u32>>,
}

/// One referrer of a callee or class
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerRef {
    pub file_id: u32,
    pub caller: String,
    pub caller_qualified: String,
    pub caller_file_path: String,
}

/// "Who uses this" tables. Keys are both qualified and plain names; the
/// plain-name entries may merge distinct same-named targets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReverseLookups {
    pub function_callers: BTreeMap<String, Vec<CallerRef>>,
    pub class_instantiators: BTreeMap<String, Vec<CallerRef>>,
    pub imports_module: BTreeMap<String, Vec<u32>>,
    /// Decorator name -> qualified names of decorated functions
    pub has_decorator: BTreeMap<String, Vec<String>>,
}

// =============================================================================
// SCAN METADATA
// =============================================================================

/// Nested directory map; files are `null` leaves
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Directory(BTreeMap<String, TreeNode>),
    File,
}

pub type DirectoryTree = BTreeMap<String, TreeNode>;

/// Files of note, by category
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialFiles {
    pub entry_points: Vec<String>,
    pub config_files: Vec<String>,
    pub documentation: Vec<String>,
    pub build_files: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectMetadata {
    pub name: String,
    pub root_path: String,
    pub indexed_at: DateTime<Utc>,
    pub total_files: usize,
    pub total_lines: u64,
}

/// Structured validation outcome; never raised
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn merge(&mut self, other: ValidationReport) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexMetadata {
    pub version: SchemaVersion,
    pub duplicate_names_support: bool,
    pub qualified_names_support: bool,
    #[serde(default)]
    pub analysis_time_ms: u64,
    /// Paths of files with at least one analysis error
    #[serde(default)]
    pub files_with_errors: Vec<String>,
    #[serde(default)]
    pub languages_analyzed: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_error: Option<String>,
    #[serde(default)]
    pub validation: ValidationReport,
}

impl Default for IndexMetadata {
    fn default() -> Self {
        Self {
            version: SchemaVersion::CURRENT,
            duplicate_names_support: true,
            qualified_names_support: true,
            analysis_time_ms: 0,
            files_with_errors: Vec::new(),
            languages_analyzed: Vec::new(),
            build_error: None,
            validation: ValidationReport::default(),
        }
    }
}

// =============================================================================
// CODE INDEX
// =============================================================================

/// The top-level aggregate and unit of persistence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeIndex {
    pub project_metadata: ProjectMetadata,
    pub directory_tree: DirectoryTree,
    pub files: Vec<FileAnalysis>,
    pub lookups: Lookups,
    pub reverse_lookups: ReverseLookups,
    pub special_files: SpecialFiles,
    pub index_metadata: IndexMetadata,
}

impl CodeIndex {
    /// Minimal well-formed index returned when the scan itself fails
    pub fn fallback(name: &str, root_path: &str, build_error: impl Into<String>) -> Self {
        Self {
            project_metadata: ProjectMetadata {
                name: name.to_string(),
                root_path: root_path.to_string(),
                indexed_at: Utc::now(),
                total_files: 0,
                total_lines: 0,
            },
            directory_tree: DirectoryTree::new(),
            files: Vec::new(),
            lookups: Lookups::default(),
            reverse_lookups: ReverseLookups::default(),
            special_files: SpecialFiles::default(),
            index_metadata: IndexMetadata {
                build_error: Some(build_error.into()),
                ..Default::default()
            },
        }
    }

    /// Look up a file entry by id
    pub fn file(&self, id: u32) -> Option<&FileAnalysis> {
        // Ids are assigned densely in order, so try the direct slot first
        match self.files.get(id as usize) {
            Some(f) if f.file.id == id => Some(f),
            _ => self.files.iter().find(|f| f.file.id == id),
        }
    }

    /// Look up a file entry by project-relative path
    pub fn file_by_path(&self, path: &str) -> Option<&FileAnalysis> {
        self.lookups
            .path_to_id
            .get(path)
            .and_then(|&id| self.file(id))
            .or_else(|| self.files.iter().find(|f| f.file.path == path))
    }

    pub fn build_error(&self) -> Option<&str> {
        self.index_metadata.build_error.as_deref()
    }
}
