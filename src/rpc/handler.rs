//! Typed procedure handlers
//!
//! A [`Handler`] wraps one registered closure. Its marshalling strategy is
//! fixed when it is built from the closure's declared argument list; each
//! call decodes the incoming parameter tree, invokes the closure exactly once
//! and encodes the returned value.

use std::{
    any::Any,
    fmt::Display,
    panic::{self, AssertUnwindSafe},
    vec,
};

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::{
    reflect::Reflect,
    strategy::{select_strategy, ArgShape, Signature, Strategy},
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HandlerError {
    #[error("invalid method params: {0}")]
    InvalidParams(String),
    #[error("{0}")]
    Internal(String),
}

impl HandlerError {
    pub fn invalid_params(reason: impl Into<String>) -> Self {
        Self::InvalidParams(reason.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

pub type Invoker = Box<dyn Fn(Vec<Value>) -> Result<Value, HandlerError> + Send + Sync>;

pub struct Handler {
    strategy: Strategy,
    arity: usize,
    invoker: Invoker,
    request_description: String,
    response_description: String,
}

impl std::fmt::Debug for Handler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handler")
            .field("strategy", &self.strategy)
            .field("arity", &self.arity)
            .field("request_description", &self.request_description)
            .field("response_description", &self.response_description)
            .finish_non_exhaustive()
    }
}

impl Handler {
    /// Builds a handler from an untyped invoker. The invoker receives the
    /// decoded argument list: empty, `arity` positional values, or the single
    /// keyed object.
    pub fn new(
        signature: Signature,
        invoker: Invoker,
        request_description: impl Into<String>,
        response_description: impl Into<String>,
    ) -> Self {
        Self {
            strategy: select_strategy(&signature),
            arity: signature.arity,
            invoker,
            request_description: request_description.into(),
            response_description: response_description.into(),
        }
    }

    pub fn from_fn<Args, H: IntoHandler<Args>>(handler: H) -> Self {
        handler.into_handler()
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    pub fn request_description(&self) -> &str {
        &self.request_description
    }

    pub fn response_description(&self) -> &str {
        &self.response_description
    }

    pub fn invoke(&self, params: Value) -> Result<Value, HandlerError> {
        let args = match self.strategy {
            Strategy::NoArgument => Vec::new(),
            Strategy::PositionalTuple => positional_args(params, self.arity)?,
            Strategy::KeyedRecord => keyed_args(params)?,
        };

        match panic::catch_unwind(AssertUnwindSafe(|| (self.invoker)(args))) {
            Ok(outcome) => outcome,
            Err(payload) => Err(HandlerError::internal(panic_message(payload.as_ref()))),
        }
    }
}

/// A one-argument tuple decodes from the bare value; wider tuples need an
/// array of exactly `arity` elements.
fn positional_args(params: Value, arity: usize) -> Result<Vec<Value>, HandlerError> {
    if arity == 1 {
        return Ok(vec![params]);
    }

    match params {
        Value::Array(items) if items.len() == arity => Ok(items),
        Value::Array(items) => Err(HandlerError::invalid_params(format!(
            "expected {arity} positional arguments, got {}",
            items.len()
        ))),
        other => Err(HandlerError::invalid_params(format!(
            "expected an array of {arity} positional arguments, got {}",
            json_kind(&other)
        ))),
    }
}

fn keyed_args(params: Value) -> Result<Vec<Value>, HandlerError> {
    if !params.is_object() {
        return Err(HandlerError::invalid_params(format!(
            "expected an object with named fields, got {}",
            json_kind(&params)
        )));
    }
    Ok(vec![params])
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        return (*message).to_string();
    }
    if let Some(message) = payload.downcast_ref::<String>() {
        return message.clone();
    }
    "procedure panicked".to_string()
}

#[doc(hidden)]
pub fn decode_arg<T: DeserializeOwned>(
    args: &mut std::iter::Enumerate<vec::IntoIter<Value>>,
) -> Result<T, HandlerError> {
    let (index, value) = args
        .next()
        .ok_or_else(|| HandlerError::invalid_params("missing argument"))?;
    serde_json::from_value(value)
        .map_err(|err| HandlerError::invalid_params(format!("argument {index}: {err}")))
}

/// Conversion of a procedure's return value into the response tree.
pub trait IntoReply {
    fn into_reply(self) -> Result<Value, HandlerError>;

    fn describe() -> String;
}

impl<T: Reflect + Serialize> IntoReply for T {
    fn into_reply(self) -> Result<Value, HandlerError> {
        serde_json::to_value(self)
            .map_err(|err| HandlerError::internal(format!("failed to encode result: {err}")))
    }

    fn describe() -> String {
        <T as Reflect>::describe()
    }
}

impl<T: Reflect + Serialize, E: Display> IntoReply for Result<T, E> {
    fn into_reply(self) -> Result<Value, HandlerError> {
        match self {
            Ok(value) => value.into_reply(),
            Err(err) => Err(HandlerError::internal(err.to_string())),
        }
    }

    fn describe() -> String {
        <T as Reflect>::describe()
    }
}

/// Closures usable as procedures. `Args` is the argument tuple, which keeps
/// the impls for different arities apart.
pub trait IntoHandler<Args>: Send + Sync + 'static {
    fn into_handler(self) -> Handler;
}

impl<F, R> IntoHandler<()> for F
where
    F: Fn() -> R + Send + Sync + 'static,
    R: IntoReply,
{
    fn into_handler(self) -> Handler {
        Handler::new(
            Signature::new(0, None),
            Box::new(move |_args: Vec<Value>| (self)().into_reply()),
            "void",
            R::describe(),
        )
    }
}

macro_rules! impl_into_handler {
    ($first:ident $(, $rest:ident)*) => {
        #[allow(non_snake_case)]
        impl<F, R, $first, $($rest,)*> IntoHandler<($first, $($rest,)*)> for F
        where
            F: Fn($first, $($rest,)*) -> R + Send + Sync + 'static,
            R: IntoReply,
            $first: Reflect + DeserializeOwned,
            $($rest: Reflect + DeserializeOwned,)*
        {
            fn into_handler(self) -> Handler {
                let described = [
                    <$first as Reflect>::describe(),
                    $(<$rest as Reflect>::describe(),)*
                ];
                let signature = Signature::new(described.len(), Some(ArgShape::of::<$first>()));
                let request_description = if described.len() == 1 {
                    described.concat()
                } else {
                    format!("({})", described.join(", "))
                };

                let invoker = move |args: Vec<Value>| {
                    let mut args = args.into_iter().enumerate();
                    let $first = decode_arg::<$first>(&mut args)?;
                    $(let $rest = decode_arg::<$rest>(&mut args)?;)*
                    (self)($first, $($rest,)*).into_reply()
                };

                Handler::new(signature, Box::new(invoker), request_description, R::describe())
            }
        }
    };
}

impl_into_handler!(A1);
impl_into_handler!(A1, A2);
impl_into_handler!(A1, A2, A3);
impl_into_handler!(A1, A2, A3, A4);
impl_into_handler!(A1, A2, A3, A4, A5);
impl_into_handler!(A1, A2, A3, A4, A5, A6);
impl_into_handler!(A1, A2, A3, A4, A5, A6, A7);
impl_into_handler!(A1, A2, A3, A4, A5, A6, A7, A8);
