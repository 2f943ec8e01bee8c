mod common;

use common::tl_lsp;

#[test]
fn discovers_primary_extension_honoring_gitignore() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("sub")).unwrap();
    std::fs::write(dir.path().join(".gitignore"), "ignored.tl\n").unwrap();
    std::fs::write(dir.path().join("ignored.tl"), "").unwrap();
    std::fs::write(dir.path().join("kept.tl"), "_x = 1").unwrap();
    std::fs::write(dir.path().join("sub/nested.tl"), "_y = 2").unwrap();
    std::fs::write(dir.path().join("other.txt"), "").unwrap();

    let output = tl_lsp()
        .args(["check", "--format", "json"])
        .current_dir(dir.path())
        .output()
        .expect("failed to run tl-lsp");

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    let json: serde_json::Value = serde_json::from_str(&stdout).expect("invalid JSON");

    assert_eq!(json["summary"]["checked_files"], 2);
    let paths: Vec<&str> = json["files"].as_array().unwrap().iter().filter_map(|f| f["path"].as_str()).collect();
    assert!(paths.iter().any(|p| p.ends_with("kept.tl")), "{paths:?}");
    assert!(paths.iter().any(|p| p.ends_with("nested.tl")), "{paths:?}");
    assert!(!paths.iter().any(|p| p.ends_with("ignored.tl")), "{paths:?}");
}

#[test]
fn a_directory_argument_is_walked_for_primary_extension_files() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.tl"), "").unwrap();
    std::fs::write(dir.path().join("b.tlc"), "").unwrap();

    let output = tl_lsp()
        .args(["check", "--format", "json", dir.path().to_str().unwrap()])
        .output()
        .expect("failed to run tl-lsp");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let json: serde_json::Value = serde_json::from_str(&stdout).expect("invalid JSON");
    assert_eq!(json["summary"]["checked_files"], 1);
}
