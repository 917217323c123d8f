//! WebSocket RPC dispatch and marshalling core
//!
//! Holds the procedure registry, the envelope protocol, and the typed
//! handler layer that picks positional or keyed marshalling per procedure.

pub mod dispatcher;
pub mod envelope;
pub mod handler;
pub mod reflect;
pub mod strategy;

pub use dispatcher::Dispatcher;
pub use handler::{Handler, HandlerError, IntoHandler, IntoReply};
pub use reflect::{Keyed, Reflect};
pub use strategy::Strategy;
