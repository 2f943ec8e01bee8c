use std::path::{Path, PathBuf};
use std::process::Command;

pub mod lsp_client;

pub fn tl_lsp() -> Command {
    Command::new(env!("CARGO_BIN_EXE_tl-lsp"))
}

/// Writes `content` to `dir/name`, returning the file's absolute path.
#[allow(dead_code)]
pub fn write_tl(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).expect("write fixture");
    path
}

/// Run `tl-lsp check --format json ARGS` and parse the output.
#[allow(dead_code)]
pub fn check_json(args: &[&str]) -> (serde_json::Value, i32) {
    let mut full_args = vec!["check", "--format", "json"];
    full_args.extend_from_slice(args);
    let output = tl_lsp().args(&full_args).output().expect("failed to run tl-lsp");
    let code = output.status.code().unwrap_or(-1);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let json: serde_json::Value = serde_json::from_str(&stdout)
        .unwrap_or_else(|e| panic!("invalid JSON: {e}\nstdout: {stdout}\nstderr: {}", String::from_utf8_lossy(&output.stderr)));
    (json, code)
}

/// Run `tl-lsp check ARGS` with `NO_COLOR=1` and return `(stderr, exit_code)`.
#[allow(dead_code)]
pub fn check_human(args: &[&str]) -> (String, i32) {
    let mut full_args = vec!["check"];
    full_args.extend_from_slice(args);
    let output = tl_lsp().env("NO_COLOR", "1").args(&full_args).output().expect("failed to run tl-lsp");
    let code = output.status.code().unwrap_or(-1);
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
    (stderr, code)
}
