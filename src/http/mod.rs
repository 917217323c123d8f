//! HTTP and WebSocket transport
//!
//! Accepts WebSocket peers on `/ws`, feeds their frames to the dispatcher,
//! and serves the documentation page and metadata endpoints.

pub mod handlers;
pub mod peers;
pub mod socket;
