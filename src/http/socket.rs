//! Per-connection WebSocket loop
//!
//! Inbound frames are processed one at a time on the connection's reader;
//! replies and broadcasts share the peer's outbound queue. A reply waits for
//! room in that queue, which holds back the reader of a slow peer.

use std::sync::Arc;

use axum::extract::ws::{close_code, CloseFrame, Message, WebSocket};
use futures::{stream::SplitSink, SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, Instrument};

use crate::{
    http::peers::{PeerId, PeerRegistry},
    logging::connection_span,
    AppState,
};

pub async fn serve_connection(socket: WebSocket, state: AppState) {
    let (peer_id, outbound) = state.peers.register();
    let span = connection_span(&peer_id);
    run_connection(socket, state, peer_id, outbound, span.clone())
        .instrument(span)
        .await;
}

async fn run_connection(
    socket: WebSocket,
    state: AppState,
    peer_id: PeerId,
    outbound: mpsc::Receiver<String>,
    span: tracing::Span,
) {
    info!(peers = state.peers.count(), "peer connected");

    let (ws_tx, mut ws_rx) = socket.split();
    let writer = tokio::spawn(
        drain_outbound(ws_tx, outbound, Arc::clone(&state.peers)).instrument(span),
    );

    while let Some(frame) = ws_rx.next().await {
        let reply = match frame {
            Ok(Message::Text(text)) => state.dispatcher.process_message(text.as_str()),
            Ok(Message::Binary(bytes)) => state.dispatcher.process_message(&bytes[..]),
            Ok(Message::Close(_)) => break,
            Ok(Message::Ping(_) | Message::Pong(_)) => continue,
            Err(err) => {
                debug!(error = %err, "websocket receive failed");
                break;
            }
        };

        if let Some(response) = reply {
            if !state.peers.send_reply(&peer_id, response).await {
                debug!("peer queue closed before reply");
                break;
            }
        }
    }

    state.peers.unregister(&peer_id);
    let _ = writer.await;
    info!(peers = state.peers.count(), "peer disconnected");
}

async fn drain_outbound(
    mut ws_tx: SplitSink<WebSocket, Message>,
    mut outbound: mpsc::Receiver<String>,
    peers: Arc<PeerRegistry>,
) {
    while let Some(payload) = outbound.recv().await {
        if ws_tx.send(Message::Text(payload.into())).await.is_err() {
            return;
        }
    }

    // The queue ends either because the peer left or because every peer is
    // being closed; only the latter announces a restart.
    if peers.is_shutting_down() {
        let _ = ws_tx
            .send(Message::Close(Some(CloseFrame {
                code: close_code::RESTART,
                reason: "connection closed".into(),
            })))
            .await;
    }
}
