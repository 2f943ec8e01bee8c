mod common;

use common::{check_human, write_tl};

#[test]
fn all_valid_prints_green_summary() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_tl(dir.path(), "a.tl", "private _x; _x = 1; _x");

    let (stderr, code) = check_human(&[path.to_str().unwrap()]);
    assert_eq!(code, 0);
    assert!(stderr.contains("All") && stderr.contains("valid"), "stderr: {stderr}");
}

#[test]
fn error_file_prints_found_and_checked_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_tl(dir.path(), "bad.tl", r#"private "x""#);

    let (stderr, code) = check_human(&[path.to_str().unwrap()]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Found") && stderr.contains("error"), "stderr: {stderr}");
    assert!(stderr.contains("Checked"), "stderr: {stderr}");
    assert!(stderr.contains("L-0003"), "stderr: {stderr}");
    assert!(stderr.contains("is not starting with an underscore"), "stderr: {stderr}");
}

#[test]
fn warning_only_file_still_renders_its_diagnostic() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_tl(dir.path(), "warn.tl", "hint _undeclared");

    let (stderr, code) = check_human(&[path.to_str().unwrap()]);
    assert_eq!(code, 0);
    assert!(stderr.contains("L-0002"), "stderr: {stderr}");
    assert!(stderr.contains("All") && stderr.contains("valid"), "stderr: {stderr}");
}

#[test]
fn missing_file_tool_error_reports_via_stderr() {
    let (stderr, code) = check_human(&["/nonexistent/does-not-exist.tl"]);
    assert_eq!(code, 2);
    assert!(stderr.contains("could not read"), "stderr: {stderr}");
}

#[test]
fn duplicate_declaration_warning_is_noted_without_failing() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_tl(dir.path(), "shadow.tl", "private _a; private _a");

    let (stderr, code) = check_human(&[path.to_str().unwrap()]);
    assert_eq!(code, 0);
    assert!(stderr.contains("L-0001"), "stderr: {stderr}");
    assert!(stderr.contains("hides previous declaration"), "stderr: {stderr}");
}
