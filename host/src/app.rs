use std::sync::Arc;

use push_pipeline::NotificationIntake;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::config::AppConfig;

const WS_CHANNEL_CAPACITY: usize = 256;

/// Application shared state accessible from axum handlers and background tasks.
#[derive(Clone)]
pub struct SharedState {
    inner: Arc<SharedStateInner>,
}

struct SharedStateInner {
    /// Broadcast channel for WebSocket messages
    ws_tx: broadcast::Sender<String>,
    config: AppConfig,
    intake: Arc<NotificationIntake>,
    shutdown_token: CancellationToken,
}

impl SharedState {
    pub fn new(config: AppConfig) -> Self {
        let (ws_tx, _) = broadcast::channel(WS_CHANNEL_CAPACITY);
        let intake = Arc::new(NotificationIntake::new(config.pipeline.clone()));

        Self {
            inner: Arc::new(SharedStateInner {
                ws_tx,
                config,
                intake,
                shutdown_token: CancellationToken::new(),
            }),
        }
    }

    pub fn server_port(&self) -> u16 {
        self.inner.config.server_port
    }

    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    pub fn ws_sender(&self) -> &broadcast::Sender<String> {
        &self.inner.ws_tx
    }

    pub fn subscribe_ws(&self) -> broadcast::Receiver<String> {
        self.inner.ws_tx.subscribe()
    }

    pub fn intake(&self) -> &Arc<NotificationIntake> {
        &self.inner.intake
    }

    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.inner.shutdown_token
    }
}
