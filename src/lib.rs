use std::sync::Arc;

use axum::{middleware, routing::get, Router};

pub mod broadcast;
pub mod config;
pub mod domain;
pub mod errors;
pub mod http;
pub mod logging;
pub mod rpc;

use broadcast::Broadcaster;
use http::peers::PeerRegistry;
use rpc::Dispatcher;

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub peers: Arc<PeerRegistry>,
}

impl AppState {
    /// Freezes the registry; procedures can no longer be added afterwards.
    pub fn new(dispatcher: Dispatcher, send_queue: usize) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
            peers: Arc::new(PeerRegistry::new(send_queue)),
        }
    }

    pub fn broadcaster(&self) -> Broadcaster {
        Broadcaster::new(self.peers.clone())
    }
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(http::handlers::documentation))
        .route("/ws", get(http::handlers::websocket))
        .route("/health", get(http::handlers::health))
        .route("/.well-known/wsrpc", get(http::handlers::discovery))
        .layer(middleware::from_fn(logging::request_logging_middleware))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use super::*;

    fn app() -> Router {
        let mut dispatcher = Dispatcher::new();
        domain::register_procedures(&mut dispatcher);
        build_app(AppState::new(dispatcher, 16))
    }

    async fn get_body(uri: &str) -> (StatusCode, axum::body::Bytes) {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri(uri)
                    .method("GET")
                    .body(Body::empty())
                    .expect("request build"),
            )
            .await
            .expect("request execution");

        let status = response.status();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("collect body")
            .to_bytes();
        (status, body)
    }

    #[tokio::test]
    async fn health_reports_peer_count() {
        let (status, body) = get_body("/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "{\"status\":\"ok\",\"peers\":0}");
    }

    #[tokio::test]
    async fn discovery_lists_procedures() {
        let (status, body) = get_body("/.well-known/wsrpc").await;
        assert_eq!(status, StatusCode::OK);

        let body_json: serde_json::Value =
            serde_json::from_slice(&body).expect("valid json response");
        assert_eq!(body_json["name"], env!("CARGO_PKG_NAME"));
        assert_eq!(body_json["websocket_endpoint"], "/ws");
        assert_eq!(
            body_json["procedures"],
            serde_json::json!(["calculate", "calculate2", "ping"])
        );
        assert_eq!(body_json["events"], 1);
    }

    #[tokio::test]
    async fn root_serves_documentation_page() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/")
                    .method("GET")
                    .body(Body::empty())
                    .expect("request build"),
            )
            .await
            .expect("request execution");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|value| value.to_str().ok()),
            Some("text/html; charset=utf-8")
        );

        let body = response
            .into_body()
            .collect()
            .await
            .expect("collect body")
            .to_bytes();
        let page = String::from_utf8(body.to_vec()).expect("utf-8 page");
        assert!(page.contains("<li>calculate: </li>"));
        assert!(page.contains("<li>returns: WorkResponse { result :: f64 }</li></ul>"));
    }

    #[tokio::test]
    async fn ws_requires_upgrade_headers() {
        let (status, _) = get_body("/ws").await;
        assert!(status.is_client_error());
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let (status, _) = get_body("/rpc").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn broadcaster_shares_the_peer_registry() {
        let state = AppState::new(Dispatcher::new(), 4);
        let (_id, mut rx) = state.peers.register();

        state.broadcaster().broadcast(&domain::ping::PingEvent { tick: 7 });

        assert_eq!(
            rx.try_recv().ok().as_deref(),
            Some(r#"{"method":"PingEvent","params":{"tick":7}}"#)
        );
    }
}
