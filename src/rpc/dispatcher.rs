//! Procedure registry and request-envelope protocol
//!
//! Parses inbound payloads, routes them to registered handlers, and wraps
//! results or faults into response envelopes. Notifications (null or absent
//! `id`) never produce a reply unless the envelope itself is malformed.

use std::{collections::BTreeMap, fmt::Write};

use serde_json::{Map, Value};
use tracing::info;

use super::{
    envelope::{
        error_response, fault_response, is_error_response, result_response, wrap_response, Fault,
        FaultCode,
    },
    handler::{Handler, IntoHandler},
    reflect::Reflect,
    strategy::Strategy,
};

#[derive(Debug, Default)]
pub struct Dispatcher {
    handlers: BTreeMap<String, Handler>,
    events: Vec<String>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a closure under `name`, replacing any earlier registration.
    pub fn register<Args, H>(&mut self, name: impl Into<String>, handler: H) -> &mut Self
    where
        H: IntoHandler<Args>,
    {
        self.register_handler(name, handler.into_handler())
    }

    pub fn register_handler(&mut self, name: impl Into<String>, handler: Handler) -> &mut Self {
        self.handlers.insert(name.into(), handler);
        self
    }

    pub fn register_event<E: Reflect>(&mut self) -> &mut Self {
        self.events.push(E::describe());
        self
    }

    pub fn handler(&self, name: &str) -> Option<&Handler> {
        self.handlers.get(name)
    }

    pub fn procedure_names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    pub fn event_descriptions(&self) -> &[String] {
        &self.events
    }

    /// Handles one inbound message, text or binary. `None` means nothing is
    /// sent back. Payloads that are not valid UTF-8 JSON are parse errors.
    pub fn process_message(&self, payload: impl AsRef<[u8]>) -> Option<String> {
        let request: Value = match serde_json::from_slice(payload.as_ref()) {
            Ok(value) => value,
            Err(err) => {
                info!(outcome = "parse_error", error = %err, "rpc message rejected");
                return Some(
                    error_response(Value::Null, FaultCode::ParseError, &err.to_string()).to_string(),
                );
            }
        };

        let Some(method) = request.get("method").and_then(Value::as_str) else {
            info!(outcome = "invalid_request", "rpc message rejected");
            return Some(
                error_response(
                    Value::Null,
                    FaultCode::InvalidRequest,
                    "expected an object with a string 'method' field",
                )
                .to_string(),
            );
        };

        let id = request.get("id").cloned().unwrap_or(Value::Null);
        let response = match self.dispatch(method, request.get("params")) {
            Ok(result) => result_response(id, result),
            Err(fault) => fault_response(id, &fault),
        };

        let outcome = if is_error_response(&response) {
            "failure"
        } else {
            "success"
        };
        let reply = wrap_response(response);
        info!(
            method = %method,
            notification = reply.is_none(),
            outcome,
            "rpc call processed"
        );
        reply
    }

    fn dispatch(&self, method: &str, params: Option<&Value>) -> Result<Value, Fault> {
        let handler = self
            .handlers
            .get(method)
            .ok_or_else(|| Fault::new(FaultCode::MethodNotFound, "procedure not found"))?;

        let params = match params {
            Some(object @ Value::Object(_)) => object.clone(),
            // Only single-element arrays are unwrapped; every other length is
            // replaced with an empty object.
            Some(Value::Array(items)) if items.len() == 1 => items[0].clone(),
            Some(Value::Array(_)) => Value::Object(Map::new()),
            None if handler.strategy() == Strategy::NoArgument => Value::Null,
            _ => {
                return Err(Fault::new(
                    FaultCode::InvalidParams,
                    "wrong type of 'params': expected array or object",
                ))
            }
        };

        handler.invoke(params).map_err(Fault::from)
    }

    /// Renders the self-description page listing procedures and events.
    pub fn process_http(&self) -> String {
        let mut page = String::from(
            "<!doctype html>\n<html><head><title>WebSocket RPC Service</title></head>\n\
             <body><p>List of supported remote procedures: </p>\n<ul>\n",
        );

        for (name, handler) in &self.handlers {
            let _ = writeln!(page, "<li>{}: </li>", escape_html(name));
            let _ = writeln!(
                page,
                "<ul><li>takes: {}</li>",
                escape_html(handler.request_description())
            );
            let _ = writeln!(
                page,
                "<li>returns: {}</li></ul>",
                escape_html(handler.response_description())
            );
        }

        page.push_str("</ul>\n<p>List of supported notifications: </p><ul>\n");
        for event in &self.events {
            let _ = writeln!(page, "<li>{}</li>", escape_html(event));
        }
        page.push_str("</ul>\n</body></html>");
        page
    }
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '&' => escaped.push_str("&amp;"),
            other => escaped.push(other),
        }
    }
    escaped
}
