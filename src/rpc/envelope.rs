//! Request/response envelope construction
//!
//! Builds the `{id, result}` / `{id, error}` response shapes and the
//! `{method, params}` event shape, and applies the notification rule.

use serde_json::{json, Value};

use super::handler::HandlerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultCode {
    ParseError = -32700,
    InvalidRequest = -32600,
    MethodNotFound = -32601,
    InvalidParams = -32602,
    InternalError = -32603,
}

impl FaultCode {
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::ParseError => "Parse error",
            Self::InvalidRequest => "Invalid Request",
            Self::MethodNotFound => "Method not found",
            Self::InvalidParams => "Invalid params",
            Self::InternalError => "Internal error",
        }
    }
}

/// A failed call, ready to be wrapped into an error envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
    pub code: FaultCode,
    pub message: String,
}

impl Fault {
    pub fn new(code: FaultCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl From<HandlerError> for Fault {
    fn from(err: HandlerError) -> Self {
        let code = match err {
            HandlerError::InvalidParams(_) => FaultCode::InvalidParams,
            HandlerError::Internal(_) => FaultCode::InternalError,
        };
        Self::new(code, err.to_string())
    }
}

pub fn error_response(id: Value, code: FaultCode, message: &str) -> Value {
    let message = if message.trim().is_empty() {
        code.name()
    } else {
        message
    };

    json!({
        "id": id,
        "error": {
            "code": code.code(),
            "message": message
        }
    })
}

pub fn fault_response(id: Value, fault: &Fault) -> Value {
    error_response(id, fault.code, &fault.message)
}

pub fn result_response(id: Value, result: Value) -> Value {
    json!({
        "id": id,
        "result": result
    })
}

pub fn event_message(name: &str, params: Value) -> Value {
    json!({
        "method": name,
        "params": params
    })
}

pub fn is_error_response(value: &Value) -> bool {
    value.get("error").is_some()
}

/// Serializes a response unless its `id` is null or absent.
pub fn wrap_response(response: Value) -> Option<String> {
    match response.get("id") {
        None | Some(Value::Null) => None,
        Some(_) => Some(response.to_string()),
    }
}
