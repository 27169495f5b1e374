use axum::{Json, extract::State, response::IntoResponse};
use std::sync::Arc;

use crate::state::AppState;

pub async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let windows: Vec<_> = state
        .gate
        .usage()
        .into_iter()
        .map(|usage| {
            serde_json::json!({
                "max_count": usage.policy.max_count(),
                "duration_secs": usage.policy.duration().as_secs(),
                "in_window": usage.in_window,
            })
        })
        .collect();

    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "rate_windows": windows,
        "sessions": state.sessions.len(),
    }))
}
