use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use std::sync::Arc;

use super::admit;
use crate::error::GatewayError;
use crate::metrics::REQUEST_TOTAL;
use crate::models::{ChatMessage, ChatTurn, CompletionRequest, Reply};
use crate::state::AppState;

pub async fn chat_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ChatTurn>,
) -> Result<Json<Reply>, GatewayError> {
    REQUEST_TOTAL.inc();
    admit(&state)?;

    // Prior turns give the model context; anonymous calls are one-shot
    let mut messages = payload
        .session_id
        .as_deref()
        .map(|id| state.history(id))
        .unwrap_or_default();
    let user = ChatMessage::user(payload.message.as_str());
    messages.push(user.clone());

    let request = CompletionRequest {
        model: state.settings.chat_model.clone(),
        messages,
        temperature: state.settings.temperature,
        max_tokens: state.settings.chat_max_tokens,
    };
    let raw = state.complete(request).await?;
    let reply = state.sanitizer.sanitize(&raw, &payload.message);

    if let Some(id) = payload.session_id.as_deref() {
        state.record_turn(id, user, ChatMessage::assistant(reply.as_str()));
    }

    Ok(Json(Reply {
        reply,
        session_id: payload.session_id,
    }))
}

pub async fn forget_session_handler(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> StatusCode {
    if state.forget(&session_id) {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}
