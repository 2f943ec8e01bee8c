//! Wire-level protocol data model (§4.3). Payload types are reused from
//! `lsp_types` wherever TL's editor-protocol usage matches LSP proper — it
//! does, for every method this server implements (`initialize`,
//! `textDocument/didChange`, `textDocument/publishDiagnostics`,
//! `textDocument/foldingRange`, `textDocument/completion`,
//! `workspace/didChangeConfiguration`, `window/logMessage`, `shutdown`,
//! `exit`). The one place the wire shape genuinely diverges from a plain
//! LSP payload is `resourceOperations`, which is a bitmask rather than the
//! single-value enum LSP proper uses it as; `resources` below backs that
//! with `bitflags` and a manual array-of-tags encoding.
//!
//! The JSON-RPC envelope itself is not part of `lsp_types` (that crate only
//! describes request/notification payloads), so `message` hand-rolls it
//! against `original_source`'s `jsonrpc.h::rpcmessage`.

mod message;
mod resources;

pub use lsp_types::{
    ClientCapabilities, CodeActionKind, CompletionItem, CompletionItemKind, CompletionList, CompletionOptions,
    CompletionParams, DidChangeConfigurationParams, DidChangeTextDocumentParams, FailureHandlingKind,
    FoldingRange, FoldingRangeKind, FoldingRangeParams, FoldingRangeProviderCapability, InitializeParams,
    InitializeResult, LogMessageParams, MarkupKind, MessageType, Position, PublishDiagnosticsParams, Range,
    ServerCapabilities, ServerInfo, SymbolKind, TextDocumentContentChangeEvent, TextDocumentIdentifier,
    TextDocumentSyncCapability, TextDocumentSyncKind, TraceValue, VersionedTextDocumentIdentifier, WorkspaceFolder,
};

pub use message::{ErrorCode, Message, ResponseError};
pub use resources::ResourceOperationKind;

/// Converts one of this crate's diagnostics into the LSP wire shape,
/// resolving its zero-based line/column range against `line_starts` is not
/// needed here: `diagnostic::Diagnostic::range` is already line/column.
pub fn to_lsp_diagnostic(diag: &crate::diagnostic::Diagnostic) -> lsp_types::Diagnostic {
    lsp_types::Diagnostic {
        range: lsp_types::Range {
            start: lsp_types::Position { line: diag.range.start.line as u32, character: diag.range.start.column as u32 },
            end: lsp_types::Position { line: diag.range.end.line as u32, character: diag.range.end.column as u32 },
        },
        severity: Some(match diag.severity {
            crate::diagnostic::Severity::Error => lsp_types::DiagnosticSeverity::ERROR,
            crate::diagnostic::Severity::Warning => lsp_types::DiagnosticSeverity::WARNING,
            crate::diagnostic::Severity::Information => lsp_types::DiagnosticSeverity::INFORMATION,
            crate::diagnostic::Severity::Hint => lsp_types::DiagnosticSeverity::HINT,
        }),
        code: Some(lsp_types::NumberOrString::String(diag.code.clone())),
        code_description: None,
        source: Some(diag.source.to_string()),
        message: diag.message.clone(),
        related_information: None,
        tags: None,
        data: None,
    }
}
