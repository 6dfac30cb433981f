//! WebSocket frame types and builders.
//!
//! Every frame is a JSON object with a `type` field; the application layer
//! routes on it.

use push_pipeline::{MethodReply, TokenEvent};
use serde_json::{Value, json};

// -- Frame type constants --

pub const CONNECTED: &str = "connected";
pub const PING: &str = "ping";
pub const PONG: &str = "pong";
pub const METHOD_CALL: &str = "method_call";
pub const METHOD_RESULT: &str = "method_result";

/// Host → application: one cross-boundary method call.
pub fn method_call_frame(channel: &str, method: &str, arguments: Value) -> Value {
    json!({
        "type": METHOD_CALL,
        "channel": channel,
        "method": method,
        "arguments": arguments,
    })
}

/// Host → application: reply to a method the application called.
pub fn method_result_frame(id: Option<&Value>, method: &str, reply: &MethodReply) -> Value {
    json!({
        "type": METHOD_RESULT,
        "id": id,
        "method": method,
        "reply": reply,
    })
}

/// Token refreshes are framed under their broadcast name.
pub fn token_frame(event: &TokenEvent) -> Value {
    json!({
        "type": event.name,
        "data": event.payload,
    })
}

#[cfg(test)]
mod tests {
    use push_pipeline::{TOKEN_EVENT_NAME, TokenPayload};

    use super::*;

    #[test]
    fn token_frame_shape() {
        let event = TokenEvent {
            name: TOKEN_EVENT_NAME,
            payload: TokenPayload {
                token: "abc123".into(),
            },
        };
        assert_eq!(
            token_frame(&event),
            json!({"type": "FCMToken", "data": {"token": "abc123"}})
        );
    }

    #[test]
    fn method_result_frame_shape() {
        let frame = method_result_frame(
            Some(&json!(7)),
            "splashScreenFinished",
            &MethodReply::Success(Value::Null),
        );
        assert_eq!(frame["id"], json!(7));
        assert_eq!(frame["reply"], json!({"status": "success", "result": null}));
    }
}
