//! File Discoverer
//!
//! Walks a project, applies the ignore policy, assigns file ids and collects
//! the scan metadata (directory tree, special files) that the index carries.
//!
//! @module scan

pub mod reader;
pub mod special;
pub mod walker;

use std::path::Path;

use tracing::info;

use crate::core::config::Config;
use crate::core::error::Result;
use crate::index::types::{DirectoryTree, FileRecord, SpecialFiles, TreeNode};

pub use reader::{ContentSource, FsContentSource, MemoryContentSource};
pub use walker::FileWalker;

/// Everything the discoverer learns about a project
#[derive(Debug, Clone)]
pub struct ScanResult {
    /// Indexable files, ids `0..n` in path order
    pub files: Vec<FileRecord>,
    pub directory_tree: DirectoryTree,
    pub special_files: SpecialFiles,
}

/// Scan a project root
pub fn scan_project(root: &Path, config: &Config) -> Result<ScanResult> {
    let walker = FileWalker::new(root, config);
    let discovered = walker.walk()?;
    let files = walker.records(&discovered);

    let special_files = special::categorize(discovered.iter().map(|f| f.path.as_str()));
    let directory_tree = build_directory_tree(files.iter().map(|f| f.path.as_str()));

    info!(
        discovered = discovered.len(),
        indexable = files.len(),
        "Scanned project"
    );

    Ok(ScanResult {
        files,
        directory_tree,
        special_files,
    })
}

/// Nest `/`-separated paths into a directory map with `null` file leaves
pub fn build_directory_tree<'a>(paths: impl IntoIterator<Item = &'a str>) -> DirectoryTree {
    let mut tree = DirectoryTree::new();
    for path in paths {
        let parts: Vec<&str> = path.split('/').collect();
        insert_path(&mut tree, &parts);
    }
    tree
}

fn insert_path(tree: &mut DirectoryTree, parts: &[&str]) {
    match parts {
        [] => {}
        [file] => {
            tree.entry(file.to_string()).or_insert(TreeNode::File);
        }
        [dir, rest @ ..] => {
            let node = tree
                .entry(dir.to_string())
                .or_insert_with(|| TreeNode::Directory(DirectoryTree::new()));
            if matches!(node, TreeNode::File) {
                *node = TreeNode::Directory(DirectoryTree::new());
            }
            if let TreeNode::Directory(children) = node {
                insert_path(children, rest);
            }
        }
    }
}
