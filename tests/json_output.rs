mod common;

use common::{check_json, write_tl};

#[test]
fn valid_file_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_tl(dir.path(), "ok.tl", "private _x; _x = 1; _x");

    let (json, code) = check_json(&[path.to_str().unwrap()]);
    assert_eq!(code, 0);
    insta::assert_json_snapshot!(json, {
        ".files[].path" => "[path]",
        ".summary.duration_ms" => "[duration]",
    }, @r#"
    {
      "files": [
        {
          "errors": [],
          "path": "[path]",
          "valid": true
        }
      ],
      "summary": {
        "checked_files": 1,
        "duration_ms": "[duration]",
        "errors": 0,
        "invalid_files": 0,
        "skipped_files": 0,
        "valid_files": 1,
        "warnings": 0
      },
      "valid": true,
      "version": 1,
      "warnings": []
    }
    "#);
}

#[test]
fn error_file_carries_an_l0003_diagnostic() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_tl(dir.path(), "bad.tl", r#"private "x""#);

    let (json, code) = check_json(&[path.to_str().unwrap()]);
    assert_eq!(code, 1);
    assert_eq!(json["valid"], false);
    assert_eq!(json["files"][0]["valid"], false);
    let errors = json["files"][0]["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0]["code"], "L-0003");
    assert_eq!(errors[0]["severity"], "error");
}

#[test]
fn warning_only_file_is_still_valid() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_tl(dir.path(), "warn.tl", "hint _undeclared");

    let (json, code) = check_json(&[path.to_str().unwrap()]);
    assert_eq!(code, 0);
    assert_eq!(json["files"][0]["valid"], true);
    let errors = json["files"][0]["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0]["code"], "L-0002");
    assert_eq!(errors[0]["severity"], "warning");
}

#[test]
fn params_array_size_mismatch_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_tl(dir.path(), "params.tl", r#"params [["_a", 1, ["SCALAR"], 0, 1, "extra"]]"#);

    let (json, code) = check_json(&[path.to_str().unwrap()]);
    assert_eq!(code, 1);
    let errors = json["files"][0]["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0]["code"], "L-0006");
}
