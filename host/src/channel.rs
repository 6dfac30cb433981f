//! [`MethodChannel`] backed by the WebSocket broadcast.

use push_pipeline::{DispatchError, MethodChannel};
use serde_json::Value;
use tokio::sync::broadcast;

use crate::events;

pub struct WsMethodChannel {
    channel_name: String,
    ws_tx: broadcast::Sender<String>,
}

impl WsMethodChannel {
    pub fn new(channel_name: impl Into<String>, ws_tx: broadcast::Sender<String>) -> Self {
        Self {
            channel_name: channel_name.into(),
            ws_tx,
        }
    }
}

impl MethodChannel for WsMethodChannel {
    fn invoke(&self, method: &str, arguments: Value) -> Result<(), DispatchError> {
        let frame = events::method_call_frame(&self.channel_name, method, arguments);
        self.ws_tx
            .send(frame.to_string())
            .map(|_| ())
            .map_err(|_| DispatchError::Closed("no websocket clients connected".into()))
    }
}
