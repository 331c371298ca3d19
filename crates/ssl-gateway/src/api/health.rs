//! `GET /health`

use super::ApiState;
use axum::{extract::State, Json};

pub async fn health_check(State(state): State<ApiState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "metrics": state.metrics.to_json(),
    }))
}
