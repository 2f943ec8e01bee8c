//! RPC dispatcher (§4.2): a method-name registry over the transport's
//! inbound/outbound queues. Mirrors `original_source`'s `jsonrpc` class —
//! `register_method`, `handle_single_message`'s dispatch-or-silent-drop
//! split between requests and notifications, and a `send` that never
//! blocks the caller.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use serde_json::Value;
use tokio::sync::mpsc;

use crate::protocol::{ErrorCode, Message};

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
}

pub type HandlerResult = Result<Option<Value>, HandlerError>;

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct HandlerError(pub String);

type Handler = Box<dyn Fn(Option<Value>) -> HandlerResult + Send + Sync>;

/// Single-threaded, synchronous message dispatcher. Holds no lifetime over
/// the transport; `pump()` is driven by whoever owns the queues.
pub struct Dispatcher {
    handlers: HashMap<&'static str, Handler>,
    next_request_id: AtomicI64,
    outbound: mpsc::UnboundedSender<String>,
}

impl Dispatcher {
    pub fn new(outbound: mpsc::UnboundedSender<String>) -> Self {
        Self { handlers: HashMap::new(), next_request_id: AtomicI64::new(1), outbound }
    }

    /// Registers (or replaces) the handler for `method`.
    pub fn register(&mut self, method: &'static str, handler: impl Fn(Option<Value>) -> HandlerResult + Send + Sync + 'static) {
        self.handlers.insert(method, Box::new(handler));
    }

    /// Allocates an id for a server-initiated request (e.g. dynamic
    /// capability registration).
    pub fn next_request_id(&self) -> i64 {
        self.next_request_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Encodes and enqueues `message` without blocking the caller.
    pub fn send(&self, message: &Message) {
        match serde_json::to_string(message) {
            Ok(body) => {
                if self.outbound.send(body).is_err() {
                    tracing::warn!("outbound queue closed, dropping message");
                }
            }
            Err(err) => tracing::error!(%err, "failed to encode outgoing message"),
        }
    }

    pub fn notify(&self, method: &str, params: Option<Value>) {
        self.send(&Message::notification(method.to_string(), params));
    }

    /// Decodes one raw inbound frame and dispatches it. Unknown-method
    /// notifications are dropped silently; unknown-method requests get a
    /// "method not found" error response. Handler panics never escape this
    /// call — they are caught and logged as an internal error.
    pub fn dispatch(&self, raw: &str) -> Result<(), DispatchError> {
        let message: Message = serde_json::from_str(raw)?;
        let Some(method) = message.method.clone() else {
            tracing::warn!("dropping message with no method (unexpected response?)");
            return Ok(());
        };

        let Some(handler) = self.handlers.get(method.as_str()) else {
            if let Some(id) = message.id.clone() {
                self.send(&Message::error_response(Some(id), ErrorCode::MethodNotFound, format!("method not found: {method}")));
            } else {
                tracing::debug!(%method, "dropping unknown-method notification");
            }
            return Ok(());
        };

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| handler(message.params.clone())));
        let result = match outcome {
            Ok(result) => result,
            Err(_) => Err(HandlerError(format!("handler for {method} panicked"))),
        };

        if let Some(id) = message.id {
            match result {
                Ok(value) => self.send(&Message::response(id, value.unwrap_or(Value::Null))),
                Err(err) => self.send(&Message::error_response(Some(id), ErrorCode::InternalError, err.0)),
            }
        } else if let Err(err) = result {
            tracing::error!(error = %err, %method, "notification handler failed");
        }
        Ok(())
    }

    /// Drains and dispatches every inbound message currently queued,
    /// returning the count processed. Used by the server's main loop in a
    /// `tokio::select!` alongside shutdown signaling.
    pub fn pump_available(&self, inbound: &mut mpsc::UnboundedReceiver<String>) -> usize {
        let mut processed = 0;
        while let Ok(raw) = inbound.try_recv() {
            if let Err(err) = self.dispatch(&raw) {
                tracing::error!(%err, "failed to dispatch inbound message");
            }
            processed += 1;
        }
        processed
    }
}
