//! Special file categorization
//!
//! @module scan/special

use glob::Pattern;
use once_cell::sync::Lazy;

use crate::index::types::SpecialFiles;

const ENTRY_POINTS: &[&str] = &[
    "__main__.py", "main.py", "app.py", "server.py", "run.py",
    "index.js", "app.js", "server.js", "main.js",
    "Main.java", "Application.java",
    "main.go", "cmd/*.go",
    "main.c", "main.cpp",
    "Program.cs", "Main.cs",
];

const CONFIG_FILES: &[&str] = &[
    "pyproject.toml", "setup.py", "setup.cfg", "requirements*.txt",
    "package.json", "package-lock.json", "yarn.lock", "tsconfig.json",
    "pom.xml", "build.gradle", "gradle.properties",
    "go.mod", "go.sum",
    "Makefile", "CMakeLists.txt",
    "*.csproj", "*.sln",
    "Gemfile", "Gemfile.lock",
    "composer.json", "composer.lock",
    "Cargo.toml", "Cargo.lock",
    "build.sbt",
    "project.clj",
    "stack.yaml", "cabal.project",
    "pubspec.yaml",
    "config.json", "settings.json", "*.ini", "*.conf", "*.cfg",
];

const DOCUMENTATION: &[&str] = &[
    "README*", "CHANGELOG*", "HISTORY*", "NEWS*",
    "LICENSE*", "COPYING*", "COPYRIGHT*",
    "CONTRIBUTING*", "CODE_OF_CONDUCT*",
    "INSTALL*", "USAGE*", "EXAMPLES*",
    "docs/**/*", "doc/**/*", "documentation/**/*",
    "*.md", "*.rst", "*.txt", "*.adoc",
];

const BUILD_FILES: &[&str] = &[
    "Dockerfile*", "docker-compose*.yml", "docker-compose*.yaml",
    ".dockerignore",
    "Jenkinsfile", ".github/**/*", ".gitlab-ci.yml",
    "azure-pipelines.yml", "appveyor.yml",
    "tox.ini", "noxfile.py",
    "webpack.config.js", "rollup.config.js", "vite.config.js",
    "gulpfile.js", "Gruntfile.js",
    "build.xml", "ant.xml",
];

/// One compiled category pattern
enum Matcher {
    /// Wildcard pattern containing `/`, matched against the whole path
    Path(Pattern),
    /// Wildcard pattern matched against the file name
    Name(Pattern),
    /// Literal file name or path
    Exact(&'static str),
}

impl Matcher {
    fn compile(raw: &'static str) -> Option<Self> {
        if raw.contains(['*', '?']) {
            let pattern = Pattern::new(raw).ok()?;
            Some(if raw.contains('/') {
                Self::Path(pattern)
            } else {
                Self::Name(pattern)
            })
        } else {
            Some(Self::Exact(raw))
        }
    }

    fn matches(&self, path: &str, name: &str) -> bool {
        match self {
            Self::Path(p) => p.matches(path),
            Self::Name(p) => p.matches(name),
            Self::Exact(s) => *s == name || *s == path,
        }
    }
}

fn compile_all(raw: &[&'static str]) -> Vec<Matcher> {
    raw.iter().copied().filter_map(Matcher::compile).collect()
}

static CATEGORIES: Lazy<[Vec<Matcher>; 4]> = Lazy::new(|| {
    [
        compile_all(ENTRY_POINTS),
        compile_all(CONFIG_FILES),
        compile_all(DOCUMENTATION),
        compile_all(BUILD_FILES),
    ]
});

/// Sort project-relative paths into special-file categories. A path may land
/// in more than one category.
pub fn categorize<'a>(paths: impl IntoIterator<Item = &'a str>) -> SpecialFiles {
    let mut special = SpecialFiles::default();
    let [entry, config, docs, build] = &*CATEGORIES;

    for path in paths {
        let name = path.rsplit('/').next().unwrap_or(path);
        let hit = |matchers: &[Matcher]| matchers.iter().any(|m| m.matches(path, name));

        if hit(entry) {
            special.entry_points.push(path.to_string());
        }
        if hit(config) {
            special.config_files.push(path.to_string());
        }
        if hit(docs) {
            special.documentation.push(path.to_string());
        }
        if hit(build) {
            special.build_files.push(path.to_string());
        }
    }

    special
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categorize() {
        let paths = [
            "main.py",
            "cmd/server/x.go",
            "cmd/tool.go",
            "requirements-dev.txt",
            "docs/guide/intro.md",
            "README.md",
            "Dockerfile.prod",
            "src/lib.rs",
        ];
        let special = categorize(paths.iter().copied());

        assert_eq!(special.entry_points, vec!["main.py", "cmd/server/x.go", "cmd/tool.go"]);
        assert_eq!(special.config_files, vec!["requirements-dev.txt"]);
        assert_eq!(
            special.documentation,
            vec!["requirements-dev.txt", "docs/guide/intro.md", "README.md"]
        );
        assert_eq!(special.build_files, vec!["Dockerfile.prod"]);
    }
}
