//! Headless push host.
//!
//! Exposes the notification intake over HTTP (OS / messaging-SDK callbacks)
//! and WebSocket (application layer), and shuts down on Ctrl+C.

use tracing_subscriber::EnvFilter;

use push_host_lib::app::SharedState;
use push_host_lib::{background, server, shutdown};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    tracing::info!("Starting push host");

    let config = push_host_lib::init_foundation()?;
    let state = SharedState::new(config);

    let server_state = state.clone();
    let server_handle = tokio::spawn(async move {
        if let Err(e) = server::start_server(server_state).await {
            tracing::error!("Server failed: {e}");
        }
    });

    // Token refreshes -> WebSocket clients
    let s = state.clone();
    tokio::spawn(async move { background::token_forward_loop(s).await });

    tracing::info!(
        port = state.server_port(),
        "Push host running. Press Ctrl+C to stop."
    );

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down...");

    shutdown::graceful_shutdown(&state).await;
    if let Err(e) = server_handle.await {
        tracing::warn!("Server task ended abnormally: {e}");
    }
    Ok(())
}
