//! Demo procedures served by the `wsrpc` binary
//!
//! A small calculator plus a ping procedure and ping event, enough to
//! exercise every marshalling strategy over a live socket.

pub mod calculator;
pub mod ping;

use crate::rpc::{Dispatcher, Keyed};

use calculator::{calculate, calculate_positional, WorkRequest};
use ping::{PingEvent, PingRequest};

pub fn register_procedures(dispatcher: &mut Dispatcher) {
    dispatcher
        .register("calculate", |Keyed(work): Keyed<WorkRequest>| calculate(work))
        .register("calculate2", calculate_positional)
        .register("ping", |Keyed(request): Keyed<PingRequest>| ping::ping(request))
        .register_event::<PingEvent>();
}
