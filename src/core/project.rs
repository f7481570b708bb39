//! Project root detection

use crate::core::error::{Error, Result};
use std::path::{Path, PathBuf};

/// Project root markers in priority order
const PROJECT_MARKERS: &[&str] = &[
    ".codeindex",     // Explicit marker
    ".git",           // Git repository
    "package.json",   // Node.js
    "Cargo.toml",     // Rust
    "pyproject.toml", // Python (modern)
    "setup.py",       // Python (legacy)
    "go.mod",         // Go
    "pom.xml",        // Java Maven
    "build.gradle",   // Java Gradle
    "CMakeLists.txt", // C/C++
    "Gemfile",        // Ruby
    "composer.json",  // PHP
];

/// A project to be indexed
#[derive(Debug, Clone)]
pub struct Project {
    /// Absolute path to project root
    pub root: PathBuf,
    /// Name of the project (directory name)
    pub name: String,
}

impl Project {
    /// Detect project from a path (searches upward for markers, falling back to the path itself)
    pub fn detect(start_path: &Path) -> Result<Self> {
        match find_project_root(start_path) {
            Ok(root) => Ok(Self::named(root)),
            Err(Error::NoProjectRoot) => Self::from_path(start_path),
            Err(e) => Err(e),
        }
    }

    /// Create project from explicit path (must exist)
    pub fn from_path(path: &Path) -> Result<Self> {
        let root = path.canonicalize().map_err(|_| Error::ProjectNotFound {
            path: path.to_path_buf(),
        })?;

        if !root.is_dir() {
            return Err(Error::ProjectNotFound { path: root });
        }

        Ok(Self::named(root))
    }

    fn named(root: PathBuf) -> Self {
        let name = project_name(&root);
        Self { root, name }
    }
}

/// Directory name of a project root, or "unknown" for `/`
pub fn project_name(root: &Path) -> String {
    root.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Find project root by searching upward for markers
fn find_project_root(start: &Path) -> Result<PathBuf> {
    let start = if start.is_file() {
        start.parent().unwrap_or(start)
    } else {
        start
    };

    let mut current = start.canonicalize().map_err(|_| Error::ProjectNotFound {
        path: start.to_path_buf(),
    })?;

    loop {
        if PROJECT_MARKERS.iter().any(|m| current.join(m).exists()) {
            return Ok(current);
        }

        match current.parent() {
            Some(parent) => current = parent.to_path_buf(),
            None => break,
        }
    }

    Err(Error::NoProjectRoot)
}
