//! Liveness probe.

use axum::Json;
use serde_json::{Value, json};

/// Returns `{"status": "ok"}` while the process is serving requests.
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
