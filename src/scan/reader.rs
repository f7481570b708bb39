//! File content reading
//!
//! Decodes source bytes through a fixed chain: UTF-8 with BOM, UTF-8,
//! Windows-1252, Latin-1. Latin-1 maps every byte, so decoding itself never
//! fails; only I/O does, and an unreadable file reads as empty.
//!
//! @module scan/reader

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::debug;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Windows-1252 code points for bytes 0x80..=0x9F; `None` is unassigned
const CP1252_HIGH: [Option<char>; 32] = [
    Some('\u{20AC}'), None, Some('\u{201A}'), Some('\u{0192}'),
    Some('\u{201E}'), Some('\u{2026}'), Some('\u{2020}'), Some('\u{2021}'),
    Some('\u{02C6}'), Some('\u{2030}'), Some('\u{0160}'), Some('\u{2039}'),
    Some('\u{0152}'), None, Some('\u{017D}'), None,
    None, Some('\u{2018}'), Some('\u{2019}'), Some('\u{201C}'),
    Some('\u{201D}'), Some('\u{2022}'), Some('\u{2013}'), Some('\u{2014}'),
    Some('\u{02DC}'), Some('\u{2122}'), Some('\u{0161}'), Some('\u{203A}'),
    Some('\u{0153}'), None, Some('\u{017E}'), Some('\u{0178}'),
];

// =============================================================================
// DECODING
// =============================================================================

/// Decode raw bytes with the first encoding in the chain that accepts them
pub fn decode(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(UTF8_BOM) {
        if let Ok(text) = std::str::from_utf8(rest) {
            return text.to_string();
        }
    }
    if let Ok(text) = std::str::from_utf8(bytes) {
        return text.to_string();
    }
    decode_cp1252(bytes).unwrap_or_else(|| decode_latin1(bytes))
}

/// Strict Windows-1252; fails on the five unassigned bytes
fn decode_cp1252(bytes: &[u8]) -> Option<String> {
    bytes
        .iter()
        .map(|&b| match b {
            0x80..=0x9F => CP1252_HIGH[(b - 0x80) as usize],
            _ => Some(b as char),
        })
        .collect()
}

fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// Read and decode a file; `None` when it cannot be read at all
pub fn read_source(path: &Path) -> Option<String> {
    match std::fs::read(path) {
        Ok(bytes) => Some(decode(&bytes)),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "Unreadable file");
            None
        }
    }
}

// =============================================================================
// CONTENT SOURCES
// =============================================================================

/// Where file content comes from, keyed by project-relative path
pub trait ContentSource: Sync {
    fn read(&self, path: &str) -> Option<String>;
}

/// Reads files under a project root through the encoding chain
#[derive(Debug, Clone)]
pub struct FsContentSource {
    root: PathBuf,
}

impl FsContentSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ContentSource for FsContentSource {
    fn read(&self, path: &str) -> Option<String> {
        read_source(&self.root.join(path))
    }
}

/// In-memory file contents
#[derive(Debug, Clone, Default)]
pub struct MemoryContentSource {
    files: HashMap<String, String>,
}

impl MemoryContentSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<String>, content: impl Into<String>) -> Self {
        self.insert(path, content);
        self
    }

    pub fn insert(&mut self, path: impl Into<String>, content: impl Into<String>) {
        self.files.insert(path.into(), content.into());
    }
}

impl ContentSource for MemoryContentSource {
    fn read(&self, path: &str) -> Option<String> {
        self.files.get(path).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_decode_chain() {
        assert_eq!(decode(b"\xEF\xBB\xBFdef f(): pass"), "def f(): pass");
        assert_eq!(decode("caf\u{e9}".as_bytes()), "caf\u{e9}");
        // 0x93/0x94 are curly quotes in Windows-1252
        assert_eq!(decode(b"\x93hi\x94"), "\u{201C}hi\u{201D}");
        // 0x81 is unassigned in Windows-1252, so Latin-1 takes over
        assert_eq!(decode(b"a\x81b"), "a\u{81}b");
    }

    #[test]
    fn test_fs_source() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("src")).unwrap();
        std::fs::write(dir.path().join("src/a.py"), b"x = '\xe9'\n").unwrap();

        let source = FsContentSource::new(dir.path());
        assert_eq!(source.read("src/a.py").as_deref(), Some("x = '\u{e9}'\n"));
        assert_eq!(source.read("missing.py"), None);
    }

    #[test]
    fn test_memory_source() {
        let source = MemoryContentSource::new().with_file("a.py", "pass\n");
        assert_eq!(source.read("a.py").as_deref(), Some("pass\n"));
        assert_eq!(source.read("b.py"), None);
    }
}
