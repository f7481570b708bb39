//! The cross-file code index
//!
//! Data model, symbol registry, relationship resolution, assembly,
//! validation, persistence and the lifecycle manager.
//!
//! @module index

pub mod assemble;
pub mod builder;
pub mod duplicates;
pub mod manager;
pub mod qualified;
pub mod query;
pub mod registry;
pub mod resolver;
pub mod schema;
pub mod storage;
pub mod types;
pub mod validate;

pub use builder::{build_index, BuildStats};
pub use duplicates::{
    analyze_duplicate_relationships, detect_duplicate_classes, detect_duplicate_functions,
    format_duplicate_report, get_duplicate_statistics, get_file_paths_for_duplicates,
};
pub use manager::{IndexManager, IndexState};
pub use qualified::{generate_qualified_name, parse_qualified_name, QualifiedNameError};
pub use query::{find_symbols_in_file, get_stats, search_symbols, FileSymbols, IndexStats, SymbolMatch};
pub use registry::SymbolRegistry;
pub use schema::SchemaVersion;
pub use storage::IndexStore;
pub use types::{CodeIndex, FileAnalysis, SymbolKind, ValidationReport};
pub use validate::validate;
