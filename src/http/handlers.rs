//! Axum HTTP handlers for the web server
//!
//! Serves the procedure documentation page, the WebSocket upgrade, and
//! health/discovery metadata.

use std::panic::{self, AssertUnwindSafe};

use axum::{
    extract::{ws::WebSocketUpgrade, State},
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::{errors::AppError, http::socket::serve_connection, AppState};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub peers: usize,
}

#[derive(Debug, Serialize)]
pub struct DiscoveryResponse {
    pub name: &'static str,
    pub version: &'static str,
    pub websocket_endpoint: &'static str,
    pub procedures: Vec<String>,
    pub events: usize,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        peers: state.peers.count(),
    })
}

pub async fn discovery(State(state): State<AppState>) -> Json<DiscoveryResponse> {
    Json(DiscoveryResponse {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        websocket_endpoint: "/ws",
        procedures: state
            .dispatcher
            .procedure_names()
            .map(str::to_string)
            .collect(),
        events: state.dispatcher.event_descriptions().len(),
    })
}

pub async fn documentation(State(state): State<AppState>) -> Response {
    match panic::catch_unwind(AssertUnwindSafe(|| state.dispatcher.process_http())) {
        Ok(page) => Html(page).into_response(),
        Err(_) => AppError::internal("documentation page generation panicked").into_response(),
    }
}

pub async fn websocket(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| serve_connection(socket, state))
}
