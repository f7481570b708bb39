//! Configuration management
//!
//! Supplies the ignore/filter policy and the pipeline knobs (worker pool
//! size, sequential threshold, storage location) to the indexer.

use crate::core::error::{Error, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the per-machine directory under the temp dir holding persisted indexes
pub const STORAGE_DIR_NAME: &str = "code_indexer";

/// File name of a persisted index inside its project directory
pub const INDEX_FILE_NAME: &str = "index.json";

/// Global configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub ignore: IgnoreConfig,
    pub index: IndexConfig,
    pub watch: WatchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IgnoreConfig {
    /// Directory names that are never descended into (dot-directories are always skipped)
    pub directories: Vec<String>,
    /// File extensions that are never considered (binaries, media, archives)
    pub extensions: Vec<String>,
    /// Extra gitignore-style globs excluded from discovery
    pub patterns: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Extensions (with leading dot) eligible for indexing
    pub extensions: Vec<String>,
    /// Maximum file size to index (bytes)
    pub max_file_size: u64,
    /// Maximum files per project
    pub max_files: usize,
    /// At or below this many files, analysis runs on the calling thread
    pub parallel_threshold: usize,
    /// Worker pool size (defaults to the number of CPUs)
    pub max_workers: Option<usize>,
    /// Root for persisted indexes (defaults to `<temp>/code_indexer`)
    pub storage_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Poll interval for backends that need one (milliseconds)
    pub poll_interval_ms: u64,
}

impl Default for IgnoreConfig {
    fn default() -> Self {
        let directories = [
            "__pycache__",
            ".pytest_cache",
            ".mypy_cache",
            "node_modules",
            ".npm",
            ".yarn",
            ".git",
            ".svn",
            ".hg",
            "build",
            "dist",
            "target",
            "out",
            "venv",
            "env",
            "virtualenv",
            ".tox",
            ".nox",
            "coverage",
            "logs",
            "log",
            "tmp",
            "temp",
        ];
        let extensions = [
            ".pyc", ".pyo", ".pyd", ".so", ".dll", ".dylib", ".class", ".jar", ".war", ".ear",
            ".exe", ".bin", ".obj", ".o", ".a", ".log", ".tmp", ".temp", ".bak", ".swp", ".png",
            ".jpg", ".jpeg", ".gif", ".bmp", ".ico", ".pdf", ".doc", ".docx", ".xls", ".xlsx",
            ".zip", ".tar", ".gz", ".rar", ".7z",
        ];
        Self {
            directories: directories.iter().map(|s| s.to_string()).collect(),
            extensions: extensions.iter().map(|s| s.to_string()).collect(),
            patterns: vec!["*.min.js".to_string(), "*.map".to_string()],
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            extensions: SUPPORTED_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            max_file_size: 1_048_576, // 1MB
            max_files: 100_000,
            parallel_threshold: 3,
            max_workers: None,
            storage_dir: None,
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 2000,
        }
    }
}

/// Extensions indexed out of the box
pub const SUPPORTED_EXTENSIONS: &[&str] = &[
    ".py", ".pyw", ".pyi", ".js", ".jsx", ".ts", ".tsx", ".mjs", ".cjs", ".java", ".c", ".cpp",
    ".h", ".hpp", ".cxx", ".cc", ".hxx", ".hh", ".cs", ".go", ".m", ".mm", ".rb", ".php",
    ".swift", ".kt", ".kts", ".rs", ".scala", ".sh", ".bash", ".zsh", ".ps1", ".bat", ".cmd",
    ".r", ".pl", ".pm", ".lua", ".dart", ".hs", ".ml", ".mli", ".fs", ".fsx", ".clj", ".cljs",
    ".vim", ".zig", ".vue", ".svelte",
];

impl Config {
    /// Load configuration from default location
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit file, defaulting when it does not exist
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let home = Self::home()?;
        Ok(home.join("config.toml"))
    }

    /// Get the codeindex home directory
    pub fn home() -> Result<PathBuf> {
        if let Ok(home) = std::env::var("CODEINDEX_HOME") {
            return Ok(PathBuf::from(home));
        }

        ProjectDirs::from("dev", "codeindex", "codeindex")
            .map(|dirs| dirs.config_dir().to_path_buf())
            .ok_or_else(|| Error::ConfigError {
                message: "Could not determine codeindex home directory".to_string(),
            })
    }

    /// Root directory holding every persisted project index
    pub fn storage_root(&self) -> PathBuf {
        self.index
            .storage_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join(STORAGE_DIR_NAME))
    }

    /// Get the index directory for a project
    pub fn index_dir(storage_root: &Path, project_path: &Path) -> PathBuf {
        let hash = xxhash_rust::xxh3::xxh3_64(project_path.to_string_lossy().as_bytes());
        storage_root.join(format!("{:016x}", hash))
    }

    /// Get the persisted index file for a project
    pub fn index_path(&self, project_path: &Path) -> PathBuf {
        Self::index_dir(&self.storage_root(), project_path).join(INDEX_FILE_NAME)
    }

    /// Whether an extension (with or without leading dot) is eligible for indexing
    pub fn is_supported_extension(&self, extension: &str) -> bool {
        let ext = normalize_extension(extension);
        !ext.is_empty() && self.index.extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext))
    }

    /// Whether an extension is on the skip list
    pub fn is_skipped_extension(&self, extension: &str) -> bool {
        let ext = normalize_extension(extension);
        self.ignore
            .extensions
            .iter()
            .any(|e| e.eq_ignore_ascii_case(&ext))
    }

    /// Whether a directory name is excluded from discovery
    pub fn is_skipped_directory(&self, name: &str) -> bool {
        name.starts_with('.') || self.ignore.directories.iter().any(|d| d == name)
    }
}

/// Lowercase an extension and make sure it carries a leading dot
pub fn normalize_extension(extension: &str) -> String {
    if extension.is_empty() {
        return String::new();
    }
    let lower = extension.to_lowercase();
    if lower.starts_with('.') {
        lower
    } else {
        format!(".{}", lower)
    }
}
