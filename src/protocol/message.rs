//! The JSON-RPC-like message envelope (§4.3). One `Message` shape covers
//! requests, responses, and notifications: a request has `id` + `method`; a
//! notification has `method` with no `id`; a response has `id` with either
//! `result` or `error` but never both.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "jsonrpc")]
    pub protocol_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ResponseError>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseError {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// JSON-RPC reserved error codes the dispatcher produces on its own.
#[derive(Debug, Clone, Copy)]
pub enum ErrorCode {
    ParseError,
    MethodNotFound,
    InvalidParams,
    InternalError,
}

impl ErrorCode {
    pub fn code(self) -> i64 {
        match self {
            ErrorCode::ParseError => -32700,
            ErrorCode::MethodNotFound => -32601,
            ErrorCode::InvalidParams => -32602,
            ErrorCode::InternalError => -32603,
        }
    }
}

impl Message {
    pub fn request(id: Value, method: impl Into<String>, params: Option<Value>) -> Self {
        Message { protocol_version: "2.0".to_string(), id: Some(id), method: Some(method.into()), params, result: None, error: None }
    }

    pub fn notification(method: impl Into<String>, params: Option<Value>) -> Self {
        Message { protocol_version: "2.0".to_string(), id: None, method: Some(method.into()), params, result: None, error: None }
    }

    pub fn response(id: Value, result: Value) -> Self {
        Message { protocol_version: "2.0".to_string(), id: Some(id), method: None, params: None, result: Some(result), error: None }
    }

    pub fn error_response(id: Option<Value>, code: ErrorCode, message: impl Into<String>) -> Self {
        Message {
            protocol_version: "2.0".to_string(),
            id,
            method: None,
            params: None,
            result: None,
            error: Some(ResponseError { code: code.code(), message: message.into(), data: None }),
        }
    }

    pub fn is_request(&self) -> bool {
        self.id.is_some() && self.method.is_some()
    }

    pub fn is_notification(&self) -> bool {
        self.id.is_none() && self.method.is_some()
    }

    pub fn is_response(&self) -> bool {
        self.method.is_none() && self.id.is_some()
    }
}
