//! Workspace bootstrapper (§4.6): mounts workspace roots into the TL VM's
//! virtual filesystem, discovers every primary-extension file, and triggers
//! an initial analysis for each. Grounded in `original_source`'s
//! `sqf_language_server.cpp::after_initialize` two-phase scan (read every
//! `$PBOPREFIX$` marker, then enumerate every primary-extension file) and
//! `m_mutex_global_declarations`/`global_declarations()` for the
//! server-wide declaration table this module hands off to.

use std::path::{Path, PathBuf};

use crate::diagnostic::Warning;
use crate::discover;
use crate::vm::Adapter;

/// Filename convention a workspace folder uses to declare the virtual
/// mount path its contents should appear under in the TL VM's filesystem.
pub const PREFIX_MARKER_NAME: &str = "$PBOPREFIX$";
/// Extension of the primary TL source file kind.
pub const PRIMARY_EXT: &str = "tl";
/// Extension of the secondary (compiles-to-primary) source file kind.
pub const SECONDARY_EXT: &str = "tlc";

/// A physical-directory ↔ virtual-path association (§3 `WorkspaceMount`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mount {
    pub physical: PathBuf,
    pub virtual_path: String,
}

impl Mount {
    pub fn new(physical: PathBuf, virtual_path: impl Into<String>) -> Self {
        Self { physical, virtual_path: normalize_virtual_path(&virtual_path.into()) }
    }
}

/// Normalizes a mount's virtual path: forward-slashed, always starting with
/// `/`, with surrounding whitespace trimmed (§3 `WorkspaceMount`).
fn normalize_virtual_path(raw: &str) -> String {
    let trimmed = raw.trim().replace('\\', "/");
    if trimmed.starts_with('/') { trimmed } else { format!("/{trimmed}") }
}

/// Outcome of a full bootstrap scan: the primary-extension files discovered
/// (ready to be queued for analysis) and any warnings encountered along the
/// way (skipped markers, non-existent folders).
pub struct ScanOutcome {
    pub primary_files: Vec<PathBuf>,
    pub warnings: Vec<Warning>,
}

/// Runs the two-phase workspace scan (§4.6) over one workspace folder root,
/// mounting every marker file's declared virtual path before enumerating
/// primary-extension files.
///
/// `on_progress` is invoked once per discovered file, mirroring the
/// "emit a progress log after each file" requirement; callers wire it to
/// `window/logMessage`.
pub fn bootstrap_folder(root: &Path, adapter: &dyn Adapter, mut on_progress: impl FnMut(&Path)) -> ScanOutcome {
    let mut warnings = Vec::new();

    if !root.exists() {
        warnings.push(Warning { code: "workspace".into(), message: format!("workspace folder does not exist: {}", root.display()) });
        return ScanOutcome { primary_files: Vec::new(), warnings };
    }

    // Phase A: locate and mount every prefix-marker file.
    let (markers, marker_warnings) = discover::discover_markers(root, PREFIX_MARKER_NAME);
    warnings.extend(marker_warnings);
    for marker in &markers {
        match std::fs::read_to_string(marker) {
            Ok(contents) => {
                let Some(dir) = marker.parent() else { continue };
                adapter.mount(dir, contents.trim());
            }
            Err(e) => {
                warnings.push(Warning { code: "workspace".into(), message: format!("skipping marker {}: {e}", marker.display()) });
            }
        }
    }

    // Phase B: enumerate every primary-extension file.
    let (files, walk_warnings) = discover::discover_by_extension(root, PRIMARY_EXT);
    warnings.extend(walk_warnings);
    for file in &files {
        on_progress(file);
    }

    ScanOutcome { primary_files: files, warnings }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vm::DefaultAdapter;

    #[test]
    fn mounts_marker_and_discovers_primary_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(PREFIX_MARKER_NAME), "\\my\\addon\n").unwrap();
        std::fs::write(dir.path().join("a.tl"), "").unwrap();
        std::fs::write(dir.path().join("b.tlc"), "").unwrap();

        let adapter = DefaultAdapter::new();
        let mut progressed = Vec::new();
        let outcome = bootstrap_folder(dir.path(), &adapter, |p| progressed.push(p.to_path_buf()));

        assert_eq!(outcome.primary_files.len(), 1);
        assert!(outcome.primary_files[0].ends_with("a.tl"));
        assert_eq!(progressed.len(), 1);

        let mounts = adapter.mounts();
        assert_eq!(mounts.len(), 1);
        assert_eq!(mounts[0].1, "/my/addon");
    }

    #[test]
    fn missing_folder_logs_a_warning_and_yields_nothing() {
        let adapter = DefaultAdapter::new();
        let outcome = bootstrap_folder(Path::new("/no/such/folder"), &adapter, |_| {});
        assert!(outcome.primary_files.is_empty());
        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(outcome.warnings[0].code, "workspace");
    }

    #[test]
    fn virtual_path_is_normalized() {
        let mount = Mount::new(PathBuf::from("/a"), " \\my\\addon \n");
        assert_eq!(mount.virtual_path, "/my/addon");
    }
}
