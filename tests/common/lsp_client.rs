#![allow(dead_code)]

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};

use tl_lsp::transport::HeaderErrorPolicy;
use tl_lsp::vm::DefaultAdapter;

/// In-process protocol test client backed by `tokio::io::duplex`, driving
/// `tl_lsp::server::run_io` directly rather than a framework harness (there
/// is no `tower_lsp`-style service abstraction here; the server owns its own
/// framing and dispatch, see `server.rs`).
pub struct TestClient {
    write: tokio::io::DuplexStream,
    read: BufReader<tokio::io::DuplexStream>,
    _server: tokio::task::JoinHandle<()>,
    next_id: AtomicI64,
}

impl TestClient {
    pub fn new() -> Self {
        let (client_write, server_read) = tokio::io::duplex(65536);
        let (server_write, client_read) = tokio::io::duplex(65536);

        let adapter = Arc::new(DefaultAdapter::new());
        let server_handle = tokio::spawn(async move {
            tl_lsp::server::run_io(server_read, server_write, adapter, HeaderErrorPolicy::Skip).await;
        });

        Self { write: client_write, read: BufReader::new(client_read), _server: server_handle, next_id: AtomicI64::new(1) }
    }

    /// Send a raw JSON-RPC message (request or notification) with LSP framing.
    pub async fn send(&mut self, msg: serde_json::Value) {
        let json = serde_json::to_string(&msg).unwrap();
        let header = format!("Content-Length: {}\r\n\r\n", json.len());
        self.write.write_all(header.as_bytes()).await.unwrap();
        self.write.write_all(json.as_bytes()).await.unwrap();
        self.write.flush().await.unwrap();
    }

    /// Receive the next LSP-framed JSON-RPC message.
    pub async fn recv(&mut self) -> serde_json::Value {
        let mut content_length: usize = 0;
        loop {
            let mut line = String::new();
            self.read.read_line(&mut line).await.unwrap();
            let line = line.trim_end_matches(['\r', '\n']);
            if line.is_empty() {
                break;
            }
            if let Some(len_str) = line.strip_prefix("Content-Length: ") {
                content_length = len_str.trim().parse().unwrap();
            }
        }
        let mut body = vec![0u8; content_length];
        self.read.read_exact(&mut body).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    /// Receive messages, discarding everything except the first message with the
    /// given `method` field. Returns the full message.
    pub async fn recv_notification(&mut self, method: &str) -> serde_json::Value {
        loop {
            let msg = self.recv().await;
            if msg["method"].as_str() == Some(method) {
                return msg;
            }
        }
    }

    /// Send `initialize` request and `initialized` notification; return the
    /// `InitializeResult` capabilities from the response.
    pub async fn initialize(&mut self) -> serde_json::Value {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.send(serde_json::json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": "initialize",
            "params": {
                "capabilities": {},
                "processId": null,
                "rootUri": null
            }
        }))
        .await;

        let response = loop {
            let msg = self.recv().await;
            if msg.get("id").is_some() {
                break msg;
            }
        };

        self.send(serde_json::json!({
            "jsonrpc": "2.0",
            "method": "initialized",
            "params": {}
        }))
        .await;

        response["result"].clone()
    }

    /// Send `textDocument/didChange` (FULL sync) for `uri`.
    pub async fn did_change(&mut self, uri: &str, version: i32, text: &str) {
        self.send(serde_json::json!({
            "jsonrpc": "2.0",
            "method": "textDocument/didChange",
            "params": {
                "textDocument": {
                    "uri": uri,
                    "version": version
                },
                "contentChanges": [{"text": text}]
            }
        }))
        .await;
    }

    /// Send `workspace/didChangeConfiguration`.
    pub async fn did_change_configuration(&mut self, settings: serde_json::Value) {
        self.send(serde_json::json!({
            "jsonrpc": "2.0",
            "method": "workspace/didChangeConfiguration",
            "params": { "settings": settings }
        }))
        .await;
    }

    /// Send `textDocument/foldingRange` request and return the result.
    pub async fn folding_range(&mut self, uri: &str) -> serde_json::Value {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.send(serde_json::json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": "textDocument/foldingRange",
            "params": {
                "textDocument": { "uri": uri }
            }
        }))
        .await;

        let response = loop {
            let msg = self.recv().await;
            if msg.get("id") == Some(&serde_json::json!(id)) && msg.get("method").is_none() {
                break msg;
            }
        };

        response["result"].clone()
    }

    /// Send `textDocument/completion` request and return the result.
    pub async fn completion(&mut self, uri: &str, line: u32, character: u32) -> serde_json::Value {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.send(serde_json::json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": "textDocument/completion",
            "params": {
                "textDocument": { "uri": uri },
                "position": { "line": line, "character": character }
            }
        }))
        .await;

        let response = loop {
            let msg = self.recv().await;
            if msg.get("id") == Some(&serde_json::json!(id)) && msg.get("method").is_none() {
                break msg;
            }
        };

        response["result"].clone()
    }

    /// Send `shutdown` request, then `exit` notification.
    pub async fn shutdown(&mut self) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.send(serde_json::json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": "shutdown",
            "params": null
        }))
        .await;
        let _ = self.recv().await;
        self.send(serde_json::json!({
            "jsonrpc": "2.0",
            "method": "exit",
            "params": null
        }))
        .await;
    }
}

/// Convenience: build a `file://` URI from an absolute path string.
#[allow(dead_code)]
pub fn file_uri(path: &str) -> String {
    format!("file://{path}")
}
