//! Messaging-token refresh broadcast.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::config::MAX_TOKEN_CAPACITY;

/// Fixed name under which token refreshes are announced.
pub const TOKEN_EVENT_NAME: &str = "FCMToken";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPayload {
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenEvent {
    pub name: &'static str,
    pub payload: TokenPayload,
}

/// Process-wide notifier for token refreshes. Listeners subscribe; emits
/// with no listener are not an error.
#[derive(Clone)]
pub struct TokenBroadcaster {
    tx: broadcast::Sender<TokenEvent>,
}

impl TokenBroadcaster {
    /// `capacity` is clamped to `1..=MAX_TOKEN_CAPACITY`.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.clamp(1, MAX_TOKEN_CAPACITY));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TokenEvent> {
        self.tx.subscribe()
    }

    /// Emit one event; a missing token is sent as an empty string.
    /// Returns the number of listeners that received it.
    pub fn emit(&self, token: Option<&str>) -> usize {
        let event = TokenEvent {
            name: TOKEN_EVENT_NAME,
            payload: TokenPayload {
                token: token.unwrap_or_default().to_string(),
            },
        };
        match self.tx.send(event) {
            Ok(listeners) => {
                tracing::info!(listeners, "Messaging token broadcast");
                listeners
            }
            Err(_) => {
                tracing::debug!("Messaging token broadcast with no listeners");
                0
            }
        }
    }
}
