//! Registry of connected WebSocket peers
//!
//! Each peer owns a bounded outbound queue drained by its writer task. All
//! sends, including broadcasts from background tasks, go through this
//! registry, so nothing writes to a socket concurrently.

use std::{
    collections::HashMap,
    fmt,
    sync::atomic::{AtomicBool, Ordering},
};

use parking_lot::RwLock;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::broadcast::PeerSink;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PeerId(Uuid);

impl PeerId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for PeerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "peer_{}", self.0)
    }
}

pub struct PeerRegistry {
    peers: RwLock<HashMap<PeerId, mpsc::Sender<String>>>,
    send_queue: usize,
    shutting_down: AtomicBool,
}

impl PeerRegistry {
    pub fn new(send_queue: usize) -> Self {
        Self {
            peers: RwLock::new(HashMap::new()),
            send_queue: send_queue.max(1),
            shutting_down: AtomicBool::new(false),
        }
    }

    /// Adds a peer and returns the receiving end of its outbound queue.
    pub fn register(&self) -> (PeerId, mpsc::Receiver<String>) {
        let id = PeerId::new();
        let (tx, rx) = mpsc::channel(self.send_queue);
        self.peers.write().insert(id.clone(), tx);
        (id, rx)
    }

    pub fn unregister(&self, id: &PeerId) {
        self.peers.write().remove(id);
    }

    pub fn count(&self) -> usize {
        self.peers.read().len()
    }

    /// Queues a reply for one peer, waiting for room in its queue. Returns
    /// `false` only if the peer is gone.
    pub async fn send_reply(&self, id: &PeerId, message: String) -> bool {
        let Some(tx) = self.peers.read().get(id).cloned() else {
            return false;
        };
        tx.send(message).await.is_ok()
    }

    /// Drops every outbound queue; writer tasks then close their sockets
    /// with a service-restart frame.
    pub fn close_all(&self) -> usize {
        self.shutting_down.store(true, Ordering::SeqCst);
        let mut peers = self.peers.write();
        let closed = peers.len();
        peers.clear();
        closed
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::SeqCst)
    }
}

/// Best-effort enqueue used for broadcasts; a full queue drops the message.
fn enqueue(id: &PeerId, tx: &mpsc::Sender<String>, message: String) {
    match tx.try_send(message) {
        Ok(()) => {}
        Err(mpsc::error::TrySendError::Full(message)) => {
            warn!(peer_id = %id, msg_len = message.len(), "send queue full, dropping message");
        }
        Err(mpsc::error::TrySendError::Closed(_)) => {
            debug!(peer_id = %id, "send queue closed");
        }
    }
}

impl PeerSink for PeerRegistry {
    fn peer_count(&self) -> usize {
        self.count()
    }

    fn send_to_all(&self, payload: &str) {
        for (id, tx) in self.peers.read().iter() {
            enqueue(id, tx, payload.to_string());
        }
    }
}
