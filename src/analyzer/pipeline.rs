//! The per-document analysis pipeline (§4.8, steps 1-7): preprocess, parse,
//! fold, hint, then run the variable-scope walker. This is the one pipeline
//! both `server`'s `textDocument/didChange` handler and the `check` CLI's
//! batch mode drive, mirroring a shared `validate_file` used from both a
//! batch runner and an LSP backend.

use crate::diagnostic::{Diagnostic, Position, Range, Severity};
use crate::document::NavHint;
use crate::protocol::FoldingRange;
use crate::vm::ast::{Node, NodeKind};
use crate::vm::{Adapter, AdapterError};

use super::declaration::{GlobalTable, SharedDeclaration};
use super::walker;

/// Everything a pipeline run recomputes for one document.
pub struct PipelineOutput {
    pub ast: Option<Node>,
    pub folding_ranges: Vec<FoldingRange>,
    pub nav_hints: Vec<NavHint>,
    pub diagnostics: Vec<Diagnostic>,
    pub private_decls: Vec<SharedDeclaration>,
    pub global_decls: Vec<SharedDeclaration>,
}

impl PipelineOutput {
    fn fatal(message: String) -> Self {
        Self {
            ast: None,
            folding_ranges: Vec::new(),
            nav_hints: Vec::new(),
            diagnostics: vec![Diagnostic::new("FATAL", Range::point(Position { line: 0, column: 0 }), message, Severity::Error)],
            private_decls: Vec::new(),
            global_decls: Vec::new(),
        }
    }

    fn parse_failed() -> Self {
        Self {
            ast: None,
            folding_ranges: Vec::new(),
            nav_hints: Vec::new(),
            diagnostics: Vec::new(),
            private_decls: Vec::new(),
            global_decls: Vec::new(),
        }
    }
}

/// Runs steps 2-6 of the pipeline over `text`, owned by `owner_path`
/// (canonical, used both as the document key and the global-table owner
/// key). Step 1 (clearing old diagnostics) and step 7 (publish-on-change)
/// are the caller's responsibility since they depend on a `Document`'s
/// prior state.
pub fn run(adapter: &dyn Adapter, origin_path: &std::path::Path, owner_path: &str, text: &str, globals: &GlobalTable) -> PipelineOutput {
    let preprocessed = match adapter.preprocess(text, origin_path) {
        Ok(text) => text,
        Err(AdapterError::Preprocess { path, source }) => {
            return PipelineOutput::fatal(format!("failed to preprocess {}: {source}", path.display()));
        }
        Err(AdapterError::Parse { .. }) => unreachable!("preprocess never raises a parse error"),
    };

    let ast = match adapter.parse(&preprocessed, origin_path) {
        Ok(ast) => ast,
        Err(_) => return PipelineOutput::parse_failed(),
    };

    let folding_ranges = compute_folding_ranges(&ast);
    let nav_hints = compute_nav_hints(&ast);
    let outcome = walker::analyze(&ast, owner_path, globals);

    PipelineOutput {
        ast: Some(ast),
        folding_ranges,
        nav_hints,
        diagnostics: outcome.diagnostics,
        private_decls: outcome.private_decls,
        global_decls: outcome.global_decls,
    }
}

/// One folding range per `ARRAY`/`CODE` node: starts at the node's own
/// token line, ends at its deepest right-descendant's token line. `root` is
/// the parser's synthetic whole-file `Code` wrapper, not a real `{}` block,
/// so it never folds itself — only its descendants are considered.
fn compute_folding_ranges(root: &Node) -> Vec<FoldingRange> {
    let mut ranges = Vec::new();
    for child in &root.children {
        collect_folding_ranges(child, &mut ranges);
    }
    ranges
}

fn collect_folding_ranges(node: &Node, out: &mut Vec<FoldingRange>) {
    if matches!(node.kind, NodeKind::Array | NodeKind::Code) {
        let end = node.deepest_right_token();
        out.push(FoldingRange {
            start_line: node.token.line.saturating_sub(1) as u32,
            start_character: None,
            end_line: end.line.saturating_sub(1) as u32,
            end_character: None,
            kind: None,
            collapsed_text: None,
        });
    }
    for child in &node.children {
        collect_folding_ranges(child, out);
    }
}

/// Flat list of nav hints ordered by source position, one per AST node.
fn compute_nav_hints(root: &Node) -> Vec<NavHint> {
    let mut hints = Vec::new();
    collect_nav_hints(root, &mut hints);
    hints
}

fn collect_nav_hints(node: &Node, out: &mut Vec<NavHint>) {
    out.push(NavHint { offset: node.token.offset, line: node.token.line, column: node.token.column });
    for child in &node.children {
        collect_nav_hints(child, out);
    }
}
