use axum::Json;
use serde_json::{Value, json};

/// Liveness probe; never touches the failure pipeline
pub async fn health_handler() -> Json<Value> {
    Json(json!({ "ok": true }))
}

pub async fn root_handler() -> Json<Value> {
    Json(json!({ "status": "Server is running" }))
}
