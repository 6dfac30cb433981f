use std::sync::Arc;

use axum::{
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::sync::mpsc;

use crate::app::SharedState;
use crate::channel::WsMethodChannel;
use crate::events;

/// WebSocket upgrade handler. A connected client is the application layer.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<SharedState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: SharedState) {
    let (mut sender, mut receiver) = socket.split();
    // Subscribe before attaching so a held notification reaches this client.
    let mut rx = state.subscribe_ws();

    let client_id = uuid::Uuid::new_v4().to_string();
    let welcome = json!({
        "type": events::CONNECTED,
        "data": {
            "clientId": client_id,
            "channel": state.config().pipeline.channel_name,
        }
    });
    if sender
        .send(Message::Text(welcome.to_string().into()))
        .await
        .is_err()
    {
        return;
    }

    tracing::info!("WebSocket client connected: {}", client_id);

    let channel = WsMethodChannel::new(
        state.config().pipeline.channel_name.clone(),
        state.ws_sender().clone(),
    );
    state.intake().attach_receiver(Arc::new(channel));

    // Replies to this client's own requests bypass the broadcast.
    let (reply_tx, mut reply_rx) = mpsc::unbounded_channel::<String>();

    // Forward broadcast messages and direct replies to this client
    let mut send_task = tokio::spawn(async move {
        loop {
            let msg = tokio::select! {
                broadcast = rx.recv() => match broadcast {
                    Ok(msg) => msg,
                    Err(_) => break,
                },
                reply = reply_rx.recv() => match reply {
                    Some(msg) => msg,
                    None => break,
                },
            };
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    });

    // Receive messages from this client and handle routing
    let recv_state = state.clone();
    let cid = client_id.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => reply_to_client(&text, &recv_state, &reply_tx),
                Message::Close(_) => break,
                _ => {}
            }
        }
        tracing::info!("WebSocket client disconnected: {}", cid);
    });

    // Wait for either task to finish
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }
}

fn reply_to_client(text: &str, state: &SharedState, replies: &mpsc::UnboundedSender<String>) {
    if let Some(reply) = handle_client_message(text, state) {
        let _ = replies.send(reply.to_string());
    }
}

/// Route an incoming client frame. Returns the reply for the sender, if any.
fn handle_client_message(text: &str, state: &SharedState) -> Option<Value> {
    let Ok(msg) = serde_json::from_str::<Value>(text) else {
        tracing::debug!("Ignoring non-JSON WebSocket message");
        return None;
    };
    let msg_type = msg.get("type").and_then(|t| t.as_str()).unwrap_or("");

    match msg_type {
        events::PING => Some(json!({ "type": events::PONG })),
        events::METHOD_CALL => {
            let method = msg.get("method").and_then(|m| m.as_str()).unwrap_or("");
            let reply = state.intake().handle_method_call(method);
            Some(events::method_result_frame(msg.get("id"), method, &reply))
        }
        other => {
            tracing::debug!(msg_type = %other, "Unhandled WebSocket message type");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[test]
    fn ping_gets_pong() {
        let state = SharedState::new(AppConfig::default());
        assert_eq!(
            handle_client_message(r#"{"type":"ping"}"#, &state),
            Some(json!({"type": "pong"}))
        );
    }

    #[test]
    fn splash_finished_method_call_is_acknowledged() {
        let state = SharedState::new(AppConfig::default());
        let reply = handle_client_message(
            r#"{"type":"method_call","id":1,"method":"splashScreenFinished"}"#,
            &state,
        )
        .unwrap();

        assert_eq!(reply["type"], json!("method_result"));
        assert_eq!(reply["id"], json!(1));
        assert_eq!(reply["reply"]["status"], json!("success"));
        assert!(state.intake().stats().splash_finished);
    }

    #[test]
    fn unknown_method_is_not_implemented() {
        let state = SharedState::new(AppConfig::default());
        let reply = handle_client_message(
            r#"{"type":"method_call","method":"openSettings"}"#,
            &state,
        )
        .unwrap();
        assert_eq!(reply["reply"], json!({"status": "not_implemented"}));
        assert_eq!(reply["id"], Value::Null);
    }

    #[test]
    fn replies_go_to_the_caller_only() {
        let state = SharedState::new(AppConfig::default());
        let mut other_client = state.subscribe_ws();
        let (reply_tx, mut reply_rx) = mpsc::unbounded_channel();

        reply_to_client(r#"{"type":"ping"}"#, &state, &reply_tx);
        reply_to_client(
            r#"{"type":"method_call","id":7,"method":"splashScreenFinished"}"#,
            &state,
            &reply_tx,
        );
        reply_to_client("not json", &state, &reply_tx);

        let pong: Value = serde_json::from_str(&reply_rx.try_recv().unwrap()).unwrap();
        assert_eq!(pong, json!({"type": "pong"}));
        let result: Value = serde_json::from_str(&reply_rx.try_recv().unwrap()).unwrap();
        assert_eq!(result["id"], json!(7));
        assert!(reply_rx.try_recv().is_err());
        assert!(other_client.try_recv().is_err());
    }

    #[test]
    fn garbage_is_ignored() {
        let state = SharedState::new(AppConfig::default());
        assert!(handle_client_message("not json", &state).is_none());
        assert!(handle_client_message(r#"{"type":"other"}"#, &state).is_none());
    }
}
