//! Validation for the `params` unary form (§4.8's reserved L-0004..L-0007
//! codes). Each entry of the params array literal declares one variable,
//! optionally paired with a default value, an allowed-type array, and a
//! count. `original_source`'s `text_document.h` declares
//! `analysis_params`/`analysis_raise_L0004..L0007` but the analysis bodies
//! themselves live outside this retrieval pack's `text_document.cpp`
//! excerpt, so the entry shapes below follow the diagnostic messages the
//! header does show (`"Missing variable string."`, `"Format Error: "`,
//! `"Array Size Missmatch. Got N."`) rather than a ported switch statement.

use crate::vm::ast::{Node, NodeKind};

use super::walker::Walker;

const MIN_ENTRY_LEN: usize = 2;
const MAX_ENTRY_LEN: usize = 4;

/// Validates and declares the variables introduced by `params ARRAY`.
pub(super) fn analysis_params(
    walker: &mut Walker,
    operand: &Node,
    depth: usize,
    known: &mut Vec<super::declaration::SharedDeclaration>,
) {
    if operand.kind != NodeKind::Array {
        walker.raise(
            "L-0005",
            operand.token,
            "Format Error: params expects an array literal.".to_string(),
            crate::diagnostic::Severity::Error,
        );
        return;
    }

    for entry in &operand.children {
        match entry.kind {
            NodeKind::String => {
                walker.declare_checked(known, depth, entry.token, &entry.content, true, false);
            }
            NodeKind::Array => validate_entry(walker, entry, depth, known),
            _ => {
                walker.raise(
                    "L-0005",
                    entry.token,
                    "Format Error: params entry must be a string or an array.".to_string(),
                    crate::diagnostic::Severity::Error,
                );
            }
        }
    }
}

fn validate_entry(
    walker: &mut Walker,
    entry: &Node,
    depth: usize,
    known: &mut Vec<super::declaration::SharedDeclaration>,
) {
    let Some(name_node) = entry.children.first() else {
        walker.raise(
            "L-0004",
            entry.token,
            "Missing variable string.".to_string(),
            crate::diagnostic::Severity::Error,
        );
        return;
    };
    if name_node.kind != NodeKind::String {
        walker.raise(
            "L-0004",
            name_node.token,
            "Missing variable string.".to_string(),
            crate::diagnostic::Severity::Error,
        );
        return;
    }
    walker.declare_checked(known, depth, name_node.token, &name_node.content, true, false);

    if entry.children.len() < MIN_ENTRY_LEN || entry.children.len() > MAX_ENTRY_LEN {
        walker.raise(
            "L-0006",
            entry.token,
            format!(
                "Array Size Missmatch. Got {}. Value was expected to be inbetween {} - {}.",
                entry.children.len(),
                MIN_ENTRY_LEN,
                MAX_ENTRY_LEN
            ),
            crate::diagnostic::Severity::Error,
        );
    }

    if let Some(types_node) = entry.children.get(2) {
        let well_formed =
            types_node.kind == NodeKind::Array && types_node.children.iter().all(|c| c.kind == NodeKind::String);
        if !well_formed {
            walker.raise(
                "L-0007",
                types_node.token,
                "Type Missmatch. Expected an array of type-name strings.".to_string(),
                crate::diagnostic::Severity::Error,
            );
        }
    }
}
