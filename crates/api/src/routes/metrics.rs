//! Operational metrics endpoint.

use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use serde_json::json;

use crate::AppState;

/// GET /metrics - Queue counters and per-endpoint request counts.
async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "event_queue": state.queue.snapshot(),
        "requests": state.metrics.snapshot(),
    }))
}

/// Creates metrics routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/metrics", get(metrics))
}
