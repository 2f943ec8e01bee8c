//! File discovery for both the workspace bootstrapper (§4.6 Phase A/B) and
//! the `check` CLI's batch mode. Walks a root directory honoring
//! `.gitignore`/`.git/info/exclude`/global excludes, narrowed to a single
//! extension match instead of a configurable glob set: only the primary
//! extension and the conventional marker filename are recognized, not a
//! user-configurable file-pattern list.

use std::path::{Path, PathBuf};

use ignore::WalkBuilder;

use crate::diagnostic::Warning;

/// Recursively discovers every file under `root` whose extension matches
/// `extension` (compared case-insensitively, without the leading dot),
/// honoring `.gitignore`. Returns `(files, warnings)`; a warning is recorded
/// per directory-walk error rather than aborting the whole scan.
pub fn discover_by_extension(root: &Path, extension: &str) -> (Vec<PathBuf>, Vec<Warning>) {
    let mut files = Vec::new();
    let mut warnings = Vec::new();

    let walker = WalkBuilder::new(root)
        .hidden(false)
        .git_ignore(true)
        .git_global(true)
        .git_exclude(true)
        .build();

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warnings.push(Warning { code: "walk".into(), message: format!("error walking directory: {e}") });
                continue;
            }
        };

        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }

        let path = entry.path();
        if has_extension(path, extension) {
            files.push(path.to_path_buf());
        }
    }

    (files, warnings)
}

/// Searches `root` (a directory) for files named `marker_name` at any depth,
/// honoring `.gitignore` the same way [`discover_by_extension`] does. Used
/// by the workspace bootstrapper's Phase A prefix-marker scan.
pub fn discover_markers(root: &Path, marker_name: &str) -> (Vec<PathBuf>, Vec<Warning>) {
    let mut files = Vec::new();
    let mut warnings = Vec::new();

    let walker = WalkBuilder::new(root).hidden(false).git_ignore(true).git_global(true).git_exclude(true).build();

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warnings.push(Warning { code: "walk".into(), message: format!("error walking directory: {e}") });
                continue;
            }
        };
        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }
        if entry.file_name() == marker_name {
            files.push(entry.path().to_path_buf());
        }
    }

    (files, warnings)
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension().and_then(|e| e.to_str()).is_some_and(|e| e.eq_ignore_ascii_case(extension))
}
