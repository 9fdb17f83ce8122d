use crate::api::AppState;
use axum::extract::State;
use axum::Json;

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Ready once a market catalogue is loaded.
pub async fn ready(State(state): State<AppState>) -> Json<serde_json::Value> {
    let assets = state.planner.context().assets().count();
    let status = if assets > 0 { "ready" } else { "empty" };
    Json(serde_json::json!({"status": status, "assets": assets}))
}
