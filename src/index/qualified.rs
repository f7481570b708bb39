//! Qualified Names
//!
//! A qualified name is `"{normalized_path}:{name}"`. It disambiguates
//! symbols that share a name across files. Parsing splits on the last
//! colon; a leading Windows drive (`C:\` or `C:/`) is never a split point.
//!
//! @module index/qualified

use thiserror::Error;

/// Why a qualified name could not be parsed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QualifiedNameError {
    #[error("qualified name is empty")]
    Empty,

    #[error("'{0}' has no ':' separating path and name")]
    MissingSeparator(String),

    #[error("'{0}' has an empty path")]
    EmptyPath(String),

    #[error("'{0}' has an empty symbol name")]
    EmptyName(String),
}

/// Normalize a project-relative path.
///
/// Backslashes become `/`, empty and `.` segments are dropped, `..` pops the
/// previous segment when there is one, and a leading `/` is removed.
pub fn normalize_path(path: &str) -> String {
    let unified = path.replace('\\', "/");
    let mut segments: Vec<&str> = Vec::new();

    for segment in unified.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(&last) if last != ".." && !is_drive(last) => {
                    segments.pop();
                }
                _ => segments.push(".."),
            },
            s => segments.push(s),
        }
    }

    segments.join("/")
}

/// Build `"{normalized_path}:{name}"`
pub fn generate_qualified_name(path: &str, name: &str) -> String {
    format!("{}:{}", normalize_path(path), name)
}

/// Split a qualified name into `(path, name)`
pub fn parse_qualified_name(qualified: &str) -> Result<(String, String), QualifiedNameError> {
    if qualified.is_empty() {
        return Err(QualifiedNameError::Empty);
    }

    // A drive prefix owns the first colon
    let search_from = if has_drive_prefix(qualified) { 2 } else { 0 };

    let split_at = qualified[search_from..]
        .rfind(':')
        .map(|i| i + search_from)
        .ok_or_else(|| QualifiedNameError::MissingSeparator(qualified.to_string()))?;

    let (path, name) = (&qualified[..split_at], &qualified[split_at + 1..]);

    if path.is_empty() {
        return Err(QualifiedNameError::EmptyPath(qualified.to_string()));
    }
    if name.is_empty() {
        return Err(QualifiedNameError::EmptyName(qualified.to_string()));
    }

    Ok((path.to_string(), name.to_string()))
}

/// `X:\` or `X:/` at the start of the string
fn has_drive_prefix(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() >= 3
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && (bytes[2] == b'\\' || bytes[2] == b'/')
}

fn is_drive(segment: &str) -> bool {
    segment.len() == 2 && segment.as_bytes()[0].is_ascii_alphabetic() && segment.ends_with(':')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_and_parse() {
        let q = generate_qualified_name("src/utils.py", "parse");
        assert_eq!(q, "src/utils.py:parse");
        assert_eq!(
            parse_qualified_name(&q).unwrap(),
            ("src/utils.py".to_string(), "parse".to_string())
        );
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("src\\pkg\\mod.py"), "src/pkg/mod.py");
        assert_eq!(normalize_path("./src//pkg/./mod.py"), "src/pkg/mod.py");
        assert_eq!(normalize_path("src/pkg/../mod.py"), "src/mod.py");
        assert_eq!(normalize_path("/abs/file.go"), "abs/file.go");
        assert_eq!(normalize_path("../outside.rs"), "../outside.rs");
        assert_eq!(normalize_path("C:\\proj\\..\\x.cs"), "C:/x.cs");
    }

    #[test]
    fn test_round_trip() {
        let paths = [
            "a.py",
            "src/utils.py",
            "deep/nested/dir/file.test.ts",
            "weird:dir/file.go",
            "C:/proj/main.cs",
            "with space/ok.rb",
        ];
        let names = ["foo", "_private", "CamelCase", "x1", "__init__"];

        for path in paths {
            for name in names {
                let q = generate_qualified_name(path, name);
                let (p, n) = parse_qualified_name(&q).unwrap();
                assert_eq!(p, normalize_path(path), "path for {}", q);
                assert_eq!(n, name, "name for {}", q);
            }
        }
    }

    #[test]
    fn test_windows_drive_letter() {
        let q = "C:\\proj\\src\\main.py:run";
        assert_eq!(
            parse_qualified_name(q).unwrap(),
            ("C:\\proj\\src\\main.py".to_string(), "run".to_string())
        );

        // The drive colon alone is not a separator
        assert_eq!(
            parse_qualified_name("C:\\proj\\main.py"),
            Err(QualifiedNameError::MissingSeparator("C:\\proj\\main.py".to_string()))
        );

        let generated = generate_qualified_name("D:\\work\\app.cs", "Main");
        assert_eq!(generated, "D:/work/app.cs:Main");
        assert_eq!(
            parse_qualified_name(&generated).unwrap(),
            ("D:/work/app.cs".to_string(), "Main".to_string())
        );
    }

    #[test]
    fn test_malformed_names() {
        assert_eq!(parse_qualified_name(""), Err(QualifiedNameError::Empty));
        assert!(matches!(
            parse_qualified_name("no_separator"),
            Err(QualifiedNameError::MissingSeparator(_))
        ));
        assert!(matches!(
            parse_qualified_name(":foo"),
            Err(QualifiedNameError::EmptyPath(_))
        ));
        assert!(matches!(
            parse_qualified_name("a.py:"),
            Err(QualifiedNameError::EmptyName(_))
        ));
    }

    #[test]
    fn test_distinct_pairs_never_collide() {
        let pairs = [
            ("pkg/a.py", "run"),
            ("pkg/b.py", "run"),
            ("pkg/a.py", "stop"),
            ("pkg", "a.py"),
            ("a/b.py", "c"),
            ("a", "b"),
        ];
        let mut seen = std::collections::HashSet::new();
        for (path, name) in pairs {
            assert!(seen.insert(generate_qualified_name(path, name)));
        }
    }
}
