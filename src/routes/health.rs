use axum::{Json, extract::State};
use serde_json::{Value, json};

use crate::router::AppState;

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let storage = if state.has_storage() {
        "configured"
    } else {
        "unconfigured"
    };
    Json(json!({ "status": "ok", "storage": storage }))
}
