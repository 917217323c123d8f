//! Server-originated event fan-out
//!
//! Events go out as `{"method": <event type>, "params": <payload>}` to every
//! connected peer, without acknowledgement or per-peer filtering.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::rpc::{envelope::event_message, Reflect};

/// The transport side of broadcasting. Implementations must accept calls
/// from any thread or task.
pub trait PeerSink: Send + Sync {
    fn peer_count(&self) -> usize;

    /// Best-effort delivery of the same payload to every connected peer.
    fn send_to_all(&self, payload: &str);
}

#[derive(Clone)]
pub struct Broadcaster {
    sink: Arc<dyn PeerSink>,
}

impl Broadcaster {
    pub fn new(sink: Arc<dyn PeerSink>) -> Self {
        Self { sink }
    }

    pub fn broadcast<E: Reflect + Serialize>(&self, event: &E) {
        if self.sink.peer_count() == 0 {
            return;
        }

        let name = E::type_name();
        let params = match serde_json::to_value(event) {
            Ok(params) => params,
            Err(err) => {
                warn!(event = %name, error = %err, "failed to serialize event");
                return;
            }
        };

        let payload = event_message(&name, params).to_string();
        debug!(event = %name, peers = self.sink.peer_count(), "broadcasting event");
        self.sink.send_to_all(&payload);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use parking_lot::Mutex;
    use serde::Serializer;

    use super::*;

    #[derive(Default)]
    struct RecordingSink {
        peers: usize,
        sent: Mutex<Vec<String>>,
    }

    impl PeerSink for RecordingSink {
        fn peer_count(&self) -> usize {
            self.peers
        }

        fn send_to_all(&self, payload: &str) {
            let mut sent = self.sent.lock();
            for _ in 0..self.peers {
                sent.push(payload.to_string());
            }
        }
    }

    static SERIALIZATIONS: AtomicUsize = AtomicUsize::new(0);

    struct CountedEvent;

    impl Reflect for CountedEvent {}

    impl Serialize for CountedEvent {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            SERIALIZATIONS.fetch_add(1, Ordering::SeqCst);
            serializer.serialize_u8(1)
        }
    }

    #[derive(Serialize)]
    struct StatusChanged {
        online: bool,
    }
    crate::reflect_record!(StatusChanged { online: bool });

    #[test]
    fn zero_peers_skips_serialization() {
        let sink = Arc::new(RecordingSink::default());
        let broadcaster = Broadcaster::new(sink.clone());

        broadcaster.broadcast(&CountedEvent);

        assert_eq!(SERIALIZATIONS.load(Ordering::SeqCst), 0);
        assert!(sink.sent.lock().is_empty());
    }

    #[test]
    fn every_peer_receives_identical_bytes() {
        let sink = Arc::new(RecordingSink {
            peers: 3,
            ..Default::default()
        });
        let broadcaster = Broadcaster::new(sink.clone());

        broadcaster.broadcast(&StatusChanged { online: true });

        let sent = sink.sent.lock();
        assert_eq!(sent.len(), 3);
        assert!(sent.iter().all(|payload| payload == &sent[0]));
        assert_eq!(
            sent[0],
            r#"{"method":"StatusChanged","params":{"online":true}}"#
        );
    }
}
