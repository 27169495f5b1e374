use axum::{Json, response::IntoResponse};

use crate::tone::{CHAT_EXAMPLES, TONE_EXAMPLES};

// Starter inputs for the demo front-ends
pub async fn examples_handler() -> impl IntoResponse {
    let tone: Vec<_> = TONE_EXAMPLES
        .iter()
        .map(|(text, tone)| serde_json::json!({ "text": text, "tone": tone }))
        .collect();

    Json(serde_json::json!({
        "chat": CHAT_EXAMPLES,
        "tone": tone,
    }))
}
