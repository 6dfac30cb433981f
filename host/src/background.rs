//! Background task loops.

use tokio::sync::broadcast::error::RecvError;

use crate::app::SharedState;
use crate::events;

/// Forward messaging-token refreshes to WebSocket clients until shutdown.
pub async fn token_forward_loop(state: SharedState) {
    let shutdown_token = state.shutdown_token().clone();
    let mut tokens = state.intake().subscribe_tokens();

    loop {
        let event = tokio::select! {
            _ = shutdown_token.cancelled() => break,
            event = tokens.recv() => event,
        };

        match event {
            Ok(event) => {
                let _ = state.ws_sender().send(events::token_frame(&event).to_string());
            }
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Token forwarder lagged");
            }
            Err(RecvError::Closed) => break,
        }
    }

    tracing::info!("Token forward loop stopped");
}
