use axum::{Json, extract::State};
use std::sync::Arc;

use super::admit;
use crate::error::GatewayError;
use crate::metrics::REQUEST_TOTAL;
use crate::models::{CompletionRequest, Reply, ToneRewrite};
use crate::state::AppState;
use crate::tone::tone_messages;

pub async fn tone_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ToneRewrite>,
) -> Result<Json<Reply>, GatewayError> {
    REQUEST_TOTAL.inc();
    admit(&state)?;

    let request = CompletionRequest {
        model: state.settings.tone_model.clone(),
        messages: tone_messages(&payload.text, &payload.tone),
        temperature: state.settings.temperature,
        max_tokens: state.settings.tone_max_tokens,
    };
    let raw = state.complete(request).await?;

    Ok(Json(Reply {
        reply: state.sanitizer.sanitize(&raw, &payload.text),
        session_id: None,
    }))
}
