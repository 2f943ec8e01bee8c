//! Transpile-on-change (§4.9): when a secondary-kind document changes and
//! secondary compilation is enabled, re-render it as primary-language
//! source and write it to a sibling file. Grounded in `original_source`'s
//! `on_sqc_file_change`, which pipes the same preprocess/parse/serialize
//! stages through to a `.sqf` sibling, stopping and logging at whichever
//! stage fails first.

use std::path::{Path, PathBuf};

use crate::vm::ast::{Node, NodeKind};
use crate::vm::Adapter;
use crate::workspace::PRIMARY_EXT;

/// Runs the transpile pipeline for one secondary-document change. `log_error`
/// is invoked (and the pipeline stops) at whichever stage fails; it is the
/// caller's hook into `window/logMessage`. Returns the path written to on
/// success.
pub fn on_secondary_change(adapter: &dyn Adapter, secondary_path: &Path, text: &str, mut log_error: impl FnMut(String)) -> Option<PathBuf> {
    let preprocessed = match adapter.preprocess(text, secondary_path) {
        Ok(text) => text,
        Err(e) => {
            log_error(format!("transpile: preprocess failed for {}: {e}", secondary_path.display()));
            return None;
        }
    };

    let ast = match adapter.parse(&preprocessed, secondary_path) {
        Ok(ast) => ast,
        Err(e) => {
            log_error(format!("transpile: parse failed for {}: {e}", secondary_path.display()));
            return None;
        }
    };

    let rendered = serialize_root(&ast);

    let primary_path = secondary_path.with_extension(PRIMARY_EXT);
    if let Err(e) = std::fs::write(&primary_path, rendered) {
        log_error(format!("transpile: failed to write {}: {e}", primary_path.display()));
        return None;
    }

    Some(primary_path)
}

/// Serializes the synthetic top-level `Code` node `parse_program` produces
/// back to source, without the enclosing braces that a nested `Code` node
/// would carry (there were never any at the top level to begin with).
fn serialize_root(root: &Node) -> String {
    let body = root.children.iter().map(serialize).collect::<Vec<_>>().join("; ");
    body.trim().to_string()
}

fn serialize(node: &Node) -> String {
    match node.kind {
        NodeKind::Code => {
            let body = node.children.iter().map(serialize).collect::<Vec<_>>().join("; ");
            format!("{{ {} }}", body.trim())
        }
        NodeKind::Array => {
            let items = node.children.iter().map(serialize).collect::<Vec<_>>().join(", ");
            format!("[{items}]")
        }
        NodeKind::Assignment => format!("{} = {}", serialize(&node.children[0]), serialize(&node.children[1])),
        NodeKind::BinaryExpr => {
            format!("{} {} {}", serialize(&node.children[0]), node.children[1].raw, serialize(&node.children[2]))
        }
        NodeKind::UnaryExpr => format!("{} {}", node.children[0].raw, serialize(&node.children[1])),
        NodeKind::Variable | NodeKind::Number => node.raw.clone(),
        NodeKind::String => format!("\"{}\"", node.raw.replace('"', "\"\"")),
        NodeKind::OperatorTag => node.raw.clone(),
    }
}
