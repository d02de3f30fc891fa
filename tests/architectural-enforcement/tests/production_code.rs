//! Production code rules for the quizbot crates

use architectural_enforcement::{production_sources, scan, workspace_root, Violation};

fn report(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn test_sources_are_found() {
    let files = production_sources(&workspace_root());
    assert!(
        files.iter().any(|path| path.ends_with("trainer.rs")),
        "scan found no trainer source, is the workspace layout different?"
    );
}

#[test]
fn test_no_blocking_sleep() {
    let files = production_sources(&workspace_root());
    let violations = scan(&files, &["std::thread::sleep", "thread::sleep("]);
    assert!(
        violations.is_empty(),
        "blocking sleep in async code:\n{}",
        report(&violations)
    );
}

#[test]
fn test_no_unwrap_or_expect_outside_tests() {
    let files = production_sources(&workspace_root());
    let violations = scan(&files, &[".unwrap()", ".expect("]);
    assert!(
        violations.is_empty(),
        "unwrap/expect in production code:\n{}",
        report(&violations)
    );
}
