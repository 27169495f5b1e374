mod chat;
mod examples;
mod health;
mod metrics;
mod tone;

pub use chat::{chat_handler, forget_session_handler};
pub use examples::examples_handler;
pub use health::health_handler;
pub use metrics::metrics_handler;
pub use tone::tone_handler;

use axum::{
    Router,
    routing::{delete, get, post},
};
use std::sync::Arc;

use crate::error::GatewayError;
use crate::metrics::RATE_LIMITED;
use crate::rate_limit::DenialScope;
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/api/examples", get(examples_handler))
        .route("/api/chat", post(chat_handler))
        .route("/api/chat/{session_id}", delete(forget_session_handler))
        .route("/api/tone", post(tone_handler))
        .with_state(state)
}

// Gate check that must pass before anything is queued for the network
fn admit(state: &AppState) -> Result<(), GatewayError> {
    state.gate.check().map_err(|denial| {
        let scope = match denial.scope {
            DenialScope::Short => "short",
            DenialScope::Long => "long",
        };
        RATE_LIMITED.with_label_values(&[scope]).inc();
        tracing::info!(window = denial.window, scope, "request rejected by rate gate");
        GatewayError::from(denial)
    })
}
