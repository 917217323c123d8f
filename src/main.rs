use std::sync::Arc;

use tracing::{info, warn};
use wsrpc::{build_app, config::Config, domain, logging, rpc::Dispatcher, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging();

    let config = Config::from_env()?;

    let mut dispatcher = Dispatcher::new();
    domain::register_procedures(&mut dispatcher);

    let bind_socket = config.bind_socket()?;
    let state = AppState::new(dispatcher, config.send_queue);
    let ticker = domain::ping::spawn_ping_ticker(state.broadcaster(), config.ping_interval);
    let app = build_app(state.clone());
    let listener = tokio::net::TcpListener::bind(bind_socket).await?;

    info!(
        bind_addr = %config.bind_addr,
        bind_port = config.bind_port,
        "server starting"
    );

    let peers = Arc::clone(&state.peers);
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                warn!(error = %err, "failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
            let closed = peers.close_all();
            info!(peers = closed, "shutting down");
        })
        .await?;

    ticker.abort();
    Ok(())
}
