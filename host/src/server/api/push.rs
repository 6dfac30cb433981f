//! Push callback API: stands in for the OS notification center and the
//! messaging SDK delivering events to the intake.

use axum::Json;
use axum::extract::State;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use push_pipeline::{Acknowledgment, IntakeOutcome, LaunchContext, RawNotification};
use serde::Deserialize;
use serde_json::{Map, Value, json};

use crate::app::SharedState;

use super::err_json;

type ApiResult = Result<Json<Value>, (axum::http::StatusCode, Json<Value>)>;

#[derive(Debug, Deserialize)]
pub struct LaunchBody {
    pub notification: Option<Map<String, Value>>,
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TokenBody {
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeviceTokenBody {
    pub device_token: String,
}

#[derive(Debug, Deserialize)]
pub struct RegistrationErrorBody {
    pub error: String,
}

fn respond(ack: Option<Acknowledgment>, outcome: IntakeOutcome) -> Json<Value> {
    Json(json!({ "acknowledgment": ack, "outcome": outcome }))
}

/// POST /api/push/launch
pub async fn launch(State(state): State<SharedState>, Json(body): Json<LaunchBody>) -> ApiResult {
    let outcome = state.intake().on_launch(LaunchContext {
        notification: body.notification.map(RawNotification::from),
        url: body.url,
    });
    Ok(respond(None, outcome))
}

/// POST /api/push/present
pub async fn present(
    State(state): State<SharedState>,
    Json(body): Json<Map<String, Value>>,
) -> ApiResult {
    let raw = RawNotification::from(body);
    let mut ack = None;
    let outcome = state.intake().will_present(&raw, |a| ack = Some(a));
    Ok(respond(ack, outcome))
}

/// POST /api/push/background
pub async fn background(
    State(state): State<SharedState>,
    Json(body): Json<Map<String, Value>>,
) -> ApiResult {
    let raw = RawNotification::from(body);
    let mut ack = None;
    let outcome = state.intake().did_receive_background(&raw, |a| ack = Some(a));
    Ok(respond(ack, outcome))
}

/// POST /api/push/tap
pub async fn tap(
    State(state): State<SharedState>,
    Json(body): Json<Map<String, Value>>,
) -> ApiResult {
    let raw = RawNotification::from(body);
    let mut ack = None;
    let outcome = state.intake().did_receive_response(&raw, |a| ack = Some(a));
    Ok(respond(ack, outcome))
}

/// POST /api/push/token
pub async fn token_refresh(
    State(state): State<SharedState>,
    Json(body): Json<TokenBody>,
) -> ApiResult {
    let listeners = state.intake().on_token_refresh(body.token.as_deref());
    Ok(Json(json!({ "status": "ok", "listeners": listeners })))
}

/// POST /api/push/device-token
pub async fn device_token(
    State(state): State<SharedState>,
    Json(body): Json<DeviceTokenBody>,
) -> ApiResult {
    let bytes = STANDARD
        .decode(body.device_token.trim())
        .map_err(|e| err_json(400, &format!("device_token must be base64: {e}")))?;
    if bytes.is_empty() {
        return Err(err_json(400, "device_token is empty"));
    }
    let hex = state.intake().device_token_registered(&bytes);
    Ok(Json(json!({ "status": "ok", "device_token": hex })))
}

/// POST /api/push/registration-error
pub async fn registration_error(
    State(state): State<SharedState>,
    Json(body): Json<RegistrationErrorBody>,
) -> ApiResult {
    state.intake().registration_failed(&body.error);
    Ok(Json(json!({ "status": "ok" })))
}

/// GET /api/push/status
pub async fn status(State(state): State<SharedState>) -> ApiResult {
    let stats = serde_json::to_value(state.intake().stats())
        .map_err(|e| err_json(500, &e.to_string()))?;
    Ok(Json(stats))
}
