//! Architectural Enforcement
//!
//! Source scans that keep production code honest:
//! - No blocking sleeps inside the async trainer or the daemon
//! - No `unwrap()`/`expect()` outside test modules
//!
//! Scans are textual on purpose. Everything after the first
//! `#[cfg(test)]` line of a file counts as test code.

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Source directories checked by the enforcement tests, relative to the workspace root
pub const PRODUCTION_DIRS: &[&str] = &["quizbot/core/src", "quizbot/daemon/src"];

/// A forbidden pattern found in production code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// File containing the match
    pub path: PathBuf,
    /// 1-based line number
    pub line: usize,
    /// The offending line, trimmed
    pub text: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}: {}", self.path.display(), self.line, self.text)
    }
}

/// Workspace root, derived from this crate's manifest directory
#[must_use]
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../..")
        .canonicalize()
        .unwrap_or_else(|_| Path::new(env!("CARGO_MANIFEST_DIR")).join("../.."))
}

/// All `.rs` files under the production directories
#[must_use]
pub fn production_sources(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = PRODUCTION_DIRS
        .iter()
        .flat_map(|dir| WalkDir::new(root.join(dir)).into_iter().filter_map(Result::ok))
        .filter(|entry| entry.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .filter(|path| path.extension().is_some_and(|ext| ext == "rs"))
        .collect();
    files.sort();
    files
}

/// Lines of `source` before its test module, with 1-based numbers
pub fn production_lines(source: &str) -> impl Iterator<Item = (usize, &str)> {
    source
        .lines()
        .enumerate()
        .take_while(|(_, line)| line.trim() != "#[cfg(test)]")
        .map(|(idx, line)| (idx + 1, line))
}

/// Find production lines containing any of `patterns`, skipping comments
#[must_use]
pub fn scan(files: &[PathBuf], patterns: &[&str]) -> Vec<Violation> {
    let mut violations = Vec::new();
    for path in files {
        let Ok(source) = fs::read_to_string(path) else {
            continue;
        };
        for (line, text) in production_lines(&source) {
            let code = text.trim_start();
            if code.starts_with("//") {
                continue;
            }
            if patterns.iter().any(|pattern| code.contains(pattern)) {
                violations.push(Violation {
                    path: path.clone(),
                    line,
                    text: code.to_string(),
                });
            }
        }
    }
    violations
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_production_lines_stop_at_test_module() {
        let source = "fn a() {}\n#[cfg(test)]\nmod tests { fn b() { x.unwrap(); } }\n";
        let lines: Vec<_> = production_lines(source).collect();
        assert_eq!(lines, vec![(1, "fn a() {}")]);
    }

    #[test]
    fn test_scan_reports_line_numbers() {
        let dir = std::env::temp_dir().join(format!("arch-scan-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let file = dir.join("sample.rs");
        fs::write(&file, "// x.unwrap() in a comment\nlet y = x.unwrap();\n").unwrap();

        let violations = scan(&[file.clone()], &[".unwrap()"]);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].line, 2);

        fs::remove_dir_all(&dir).unwrap();
    }
}
