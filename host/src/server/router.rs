use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;

use super::{api, websocket};
use crate::app::SharedState;

/// Create the axum router with all routes.
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        // --- Core ---
        .route("/status", get(status_handler))
        .route("/ws", get(websocket::ws_handler))
        // --- OS / SDK callbacks ---
        .route("/api/push/launch", post(api::push::launch))
        .route("/api/push/present", post(api::push::present))
        .route("/api/push/background", post(api::push::background))
        .route("/api/push/tap", post(api::push::tap))
        .route("/api/push/token", post(api::push::token_refresh))
        .route("/api/push/device-token", post(api::push::device_token))
        .route("/api/push/registration-error", post(api::push::registration_error))
        // --- Diagnostics ---
        .route("/api/push/status", get(api::push::status))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn status_handler() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
