//! Liveness procedure and the periodic ping event

use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use crate::broadcast::Broadcaster;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PingRequest {}
crate::reflect_record!(PingRequest {});

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PongResponse {
    pub response: String,
    pub tick: u64,
}
crate::reflect_record!(PongResponse {
    response: String,
    tick: u64,
});

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PingEvent {
    pub tick: u64,
}
crate::reflect_record!(PingEvent { tick: u64 });

/// Seconds since the Unix epoch.
pub fn current_tick() -> u64 {
    u64::try_from(Utc::now().timestamp()).unwrap_or_default()
}

pub fn ping(_request: PingRequest) -> PongResponse {
    PongResponse {
        response: "pong".to_string(),
        tick: current_tick(),
    }
}

pub fn spawn_ping_ticker(broadcaster: Broadcaster, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            broadcaster.broadcast(&PingEvent {
                tick: current_tick(),
            });
        }
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::*;
    use crate::broadcast::PeerSink;

    #[derive(Default)]
    struct CollectingSink {
        sent: Mutex<Vec<String>>,
    }

    impl PeerSink for CollectingSink {
        fn peer_count(&self) -> usize {
            1
        }

        fn send_to_all(&self, payload: &str) {
            self.sent.lock().push(payload.to_string());
        }
    }

    #[test]
    fn ping_answers_pong() {
        let pong = ping(PingRequest::default());
        assert_eq!(pong.response, "pong");
        assert!(pong.tick > 0);
    }

    #[tokio::test]
    async fn ticker_broadcasts_ping_events() {
        let sink = Arc::new(CollectingSink::default());
        let ticker = spawn_ping_ticker(
            Broadcaster::new(sink.clone()),
            Duration::from_millis(10),
        );

        tokio::time::sleep(Duration::from_millis(100)).await;
        ticker.abort();

        let sent = sink.sent.lock();
        assert!(!sent.is_empty());
        assert!(sent[0].starts_with(r#"{"method":"PingEvent","params":{"tick":"#));
    }
}
