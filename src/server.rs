//! The server proper (§4.1-§4.9, §5, §6): wires the transport, dispatcher,
//! document store, analysis pipeline, workspace bootstrapper, and
//! transpile-on-change stage together into the seven handlers the protocol
//! names. Grounded in `original_source`'s `sqf_language_server.cpp` method
//! table and in a `lsp.rs` `Backend`/`spawn_validation` split, minus the
//! debounce and encoding-negotiation machinery this crate's LSP-facing
//! surface has no use for.

use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;

use crate::analyzer::{self, GlobalTable};
use crate::config::{GlobalConfiguration, RawConfiguration};
use crate::document::{DocumentKind, DocumentStore};
use crate::protocol::{
    self, CompletionList, CompletionOptions, CompletionParams, DidChangeConfigurationParams, DidChangeTextDocumentParams,
    FoldingRangeParams, FoldingRangeProviderCapability, InitializeParams, InitializeResult, LogMessageParams,
    MessageType, PublishDiagnosticsParams, ServerCapabilities, ServerInfo, TextDocumentSyncCapability, TextDocumentSyncKind,
};
use crate::rpc::{Dispatcher, HandlerError, HandlerResult};
use crate::transport::{HeaderErrorPolicy, Transport};
use crate::transpile;
use crate::uri::Uri;
use crate::vm::Adapter;
use crate::workspace::{self, SECONDARY_EXT};

/// Shared server-wide state every handler reads or mutates through
/// `Arc<ServerContext>`. Analogous to a `Backend` struct, minus the client
/// handle (this crate's transport has no request-response handle back into
/// the dispatcher other than the raw outbound queue).
pub struct ServerContext {
    pub documents: DocumentStore,
    pub globals: GlobalTable,
    pub adapter: Arc<dyn Adapter>,
    pub config: GlobalConfiguration,
    pub workspace_roots: Mutex<Vec<PathBuf>>,
}

impl ServerContext {
    pub fn new(adapter: Arc<dyn Adapter>) -> Self {
        Self {
            documents: DocumentStore::new(),
            globals: GlobalTable::new(),
            adapter,
            config: GlobalConfiguration::new(),
            workspace_roots: Mutex::new(Vec::new()),
        }
    }
}

/// Runs the server over stdio until `shutdown`/`exit` sets the die flag.
pub async fn run_server(adapter: Arc<dyn Adapter>, policy: HeaderErrorPolicy) {
    run_io(tokio::io::stdin(), tokio::io::stdout(), adapter, policy).await;
}

/// Runs the server over an arbitrary duplex byte stream; the entry point
/// both `run_server` and integration tests (`tokio::io::duplex`) use.
pub async fn run_io<R, W>(reader: R, writer: W, adapter: Arc<dyn Adapter>, policy: HeaderErrorPolicy)
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let transport = Transport::spawn(reader, writer, policy);
    let ctx = Arc::new(ServerContext::new(adapter));
    let outbound = transport.outbound.clone();
    let terminate = transport.terminate.clone();

    let mut dispatcher = Dispatcher::new(transport.outbound.clone());
    register_handlers(&mut dispatcher, ctx, outbound, terminate.clone());

    let mut inbound = transport.inbound;
    const IDLE_POLL: std::time::Duration = std::time::Duration::from_millis(10);
    loop {
        if terminate.load(Ordering::Relaxed) {
            break;
        }
        dispatcher.pump_available(&mut inbound);
        tokio::time::sleep(IDLE_POLL).await;
    }
}

fn register_handlers(
    dispatcher: &mut Dispatcher,
    ctx: Arc<ServerContext>,
    outbound: mpsc::UnboundedSender<String>,
    terminate: Arc<std::sync::atomic::AtomicBool>,
) {
    dispatcher.register("initialize", {
        let ctx = ctx.clone();
        move |params| handle_initialize(&ctx, params)
    });

    dispatcher.register("initialized", {
        let ctx = ctx.clone();
        let outbound = outbound.clone();
        move |_params| {
            let roots = ctx.workspace_roots.lock().clone();
            let ctx = ctx.clone();
            let outbound = outbound.clone();
            tokio::task::spawn_blocking(move || bootstrap_workspace(&ctx, &roots, &outbound));
            Ok(None)
        }
    });

    dispatcher.register("workspace/didChangeConfiguration", {
        let ctx = ctx.clone();
        move |params| handle_did_change_configuration(&ctx, params)
    });

    dispatcher.register("textDocument/didChange", {
        let ctx = ctx.clone();
        let outbound = outbound.clone();
        move |params| {
            let params: DidChangeTextDocumentParams =
                serde_json::from_value(params.unwrap_or(Value::Null)).map_err(|e| HandlerError(e.to_string()))?;
            let uri = Uri::parse(&params.text_document.uri.to_string()).map_err(|e| HandlerError(e.to_string()))?;
            let path = uri.to_file_path().ok_or_else(|| HandlerError("not a file:// uri".to_string()))?;
            let text = params.content_changes.into_iter().next_back().map(|c| c.text).unwrap_or_default();
            let kind = document_kind(&path);

            let ctx = ctx.clone();
            let outbound = outbound.clone();
            tokio::task::spawn_blocking(move || handle_did_change(&ctx, &path, kind, text, &outbound));
            Ok(None)
        }
    });

    dispatcher.register("textDocument/foldingRange", {
        let ctx = ctx.clone();
        move |params| handle_folding_range(&ctx, params)
    });

    dispatcher.register("textDocument/completion", {
        let ctx = ctx.clone();
        move |params| handle_completion(&ctx, params)
    });

    dispatcher.register("shutdown", {
        let terminate = terminate.clone();
        move |_params| {
            terminate.store(true, Ordering::Relaxed);
            Ok(Some(Value::Null))
        }
    });

    dispatcher.register("exit", move |_params| {
        terminate.store(true, Ordering::Relaxed);
        Ok(None)
    });
}

fn document_kind(path: &Path) -> DocumentKind {
    if path.extension().and_then(|e| e.to_str()).is_some_and(|e| e.eq_ignore_ascii_case(SECONDARY_EXT)) {
        DocumentKind::Secondary
    } else {
        DocumentKind::Primary
    }
}

fn handle_initialize(ctx: &ServerContext, params: Option<Value>) -> HandlerResult {
    let params: InitializeParams = serde_json::from_value(params.unwrap_or(Value::Null)).map_err(|e| HandlerError(e.to_string()))?;

    let mut roots = Vec::new();
    if let Some(folders) = params.workspace_folders {
        for folder in folders {
            if let Ok(uri) = Uri::parse(&folder.uri.to_string()) {
                if let Some(path) = uri.to_file_path() {
                    roots.push(path);
                }
            }
        }
    }
    *ctx.workspace_roots.lock() = roots;

    let result = InitializeResult {
        capabilities: ServerCapabilities {
            text_document_sync: Some(TextDocumentSyncCapability::Kind(TextDocumentSyncKind::FULL)),
            folding_range_provider: Some(FoldingRangeProviderCapability::Simple(true)),
            completion_provider: Some(CompletionOptions::default()),
            ..Default::default()
        },
        server_info: Some(ServerInfo { name: "tl-lsp".to_string(), version: Some(env!("CARGO_PKG_VERSION").to_string()) }),
    };
    Ok(Some(serde_json::to_value(result).map_err(|e| HandlerError(e.to_string()))?))
}

fn handle_did_change_configuration(ctx: &ServerContext, params: Option<Value>) -> HandlerResult {
    let params: DidChangeConfigurationParams =
        serde_json::from_value(params.unwrap_or(Value::Null)).map_err(|e| HandlerError(e.to_string()))?;
    let raw: RawConfiguration = serde_json::from_value(params.settings).unwrap_or_default();
    if let Some(mounts) = ctx.config.apply(&raw) {
        for mount in mounts {
            ctx.adapter.mount(&mount.physical, &mount.virtual_path);
        }
    }
    Ok(None)
}

fn handle_folding_range(ctx: &ServerContext, params: Option<Value>) -> HandlerResult {
    let params: FoldingRangeParams = serde_json::from_value(params.unwrap_or(Value::Null)).map_err(|e| HandlerError(e.to_string()))?;
    let uri = Uri::parse(&params.text_document.uri.to_string()).map_err(|e| HandlerError(e.to_string()))?;
    let path = uri.to_file_path().ok_or_else(|| HandlerError("not a file:// uri".to_string()))?;
    let ranges = ctx.documents.get(&path).map(|doc| doc.lock().folding_ranges.clone()).unwrap_or_default();
    Ok(Some(serde_json::to_value(ranges).map_err(|e| HandlerError(e.to_string()))?))
}

/// Resolves the nav hint at the cursor (plumbing for a future completion
/// strategy) but always returns an empty list, per the open question this
/// crate leaves unresolved beyond nav-hint lookup.
fn handle_completion(ctx: &ServerContext, params: Option<Value>) -> HandlerResult {
    let params: CompletionParams = serde_json::from_value(params.unwrap_or(Value::Null)).map_err(|e| HandlerError(e.to_string()))?;
    let text_document_position = params.text_document_position;
    if let Ok(uri) = Uri::parse(&text_document_position.text_document.uri.to_string()) {
        if let Some(path) = uri.to_file_path() {
            if let Some(doc) = ctx.documents.get(&path) {
                let position = text_document_position.position;
                let _ = doc.lock().nav_hint_at(position.line as usize + 1, position.character as usize);
            }
        }
    }
    let list = CompletionList { is_incomplete: false, items: Vec::new() };
    Ok(Some(serde_json::to_value(list).map_err(|e| HandlerError(e.to_string()))?))
}

/// Runs the workspace bootstrap scan (§4.6) for every folder handed to
/// `initialize`, analyzing each discovered primary-extension file.
fn bootstrap_workspace(ctx: &ServerContext, roots: &[PathBuf], outbound: &mpsc::UnboundedSender<String>) {
    for root in roots {
        let outcome = workspace::bootstrap_folder(root, ctx.adapter.as_ref(), |_path| {});
        for warning in outcome.warnings {
            log_message(outbound, MessageType::WARNING, format!("{}: {}", warning.code, warning.message));
        }
        for file in outcome.primary_files {
            match std::fs::read_to_string(&file) {
                Ok(text) => handle_did_change(ctx, &file, DocumentKind::Primary, text, outbound),
                Err(e) => log_message(outbound, MessageType::ERROR, format!("failed to read {}: {e}", file.display())),
            }
        }
    }
}

/// Runs the analysis pipeline for one document change (§4.8 steps 1-7),
/// publishes diagnostics if they changed, and (for secondary documents with
/// secondary compilation enabled) runs transpile-on-change (§4.9).
fn handle_did_change(ctx: &ServerContext, path: &Path, kind: DocumentKind, text: String, outbound: &mpsc::UnboundedSender<String>) {
    let owner_path = path.to_string_lossy().into_owned();
    let output = analyzer::run_pipeline(ctx.adapter.as_ref(), path, &owner_path, &text, &ctx.globals);

    let (was_empty, is_empty) = ctx.documents.locked(path, kind, |doc| {
        let was_empty = doc.diagnostics.is_empty();
        doc.text = text.clone();
        doc.ast = output.ast;
        doc.folding_ranges = output.folding_ranges;
        doc.nav_hints = output.nav_hints;
        doc.diagnostics = output.diagnostics;
        doc.private_decls = output.private_decls;
        doc.global_decls = output.global_decls;
        (was_empty, doc.diagnostics.is_empty())
    });

    if !was_empty || !is_empty {
        publish_diagnostics(ctx, path, outbound);
    }

    if kind == DocumentKind::Secondary && ctx.config.secondary_compilation_enabled() {
        transpile::on_secondary_change(ctx.adapter.as_ref(), path, &text, |message| {
            log_message(outbound, MessageType::ERROR, message);
        });
    }
}

fn publish_diagnostics(ctx: &ServerContext, path: &Path, outbound: &mpsc::UnboundedSender<String>) {
    let Some(doc) = ctx.documents.get(path) else { return };
    let diagnostics = doc.lock().diagnostics.iter().map(protocol::to_lsp_diagnostic).collect::<Vec<_>>();
    let uri_text = Uri::from_file_path(path).encoded();
    let Ok(uri) = uri_text.parse::<lsp_types::Uri>() else { return };
    let params = PublishDiagnosticsParams { uri, diagnostics, version: None };
    notify(outbound, "textDocument/publishDiagnostics", serde_json::to_value(params).ok());
}

fn log_message(outbound: &mpsc::UnboundedSender<String>, typ: MessageType, message: String) {
    let params = LogMessageParams { typ, message };
    notify(outbound, "window/logMessage", serde_json::to_value(params).ok());
}

fn notify(outbound: &mpsc::UnboundedSender<String>, method: &str, params: Option<Value>) {
    let message = crate::protocol::Message::notification(method.to_string(), params);
    if let Ok(body) = serde_json::to_string(&message) {
        let _ = outbound.send(body);
    }
}
