use axum::{extract::State, Json};
use chrono::Utc;
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /api/health
/// Reports liveness and which datastore the process is running against.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": Utc::now(),
        "mode": state.store.mode(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
