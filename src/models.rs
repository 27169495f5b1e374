use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::error::GatewayError;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

// Completion API request format
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

// Completion API response format. Either `choices` or `error` is present.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct CompletionResponse {
    #[serde(default)]
    pub choices: Option<Vec<Choice>>,
    #[serde(default)]
    pub error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiErrorBody {
    pub message: String,
}

impl CompletionResponse {
    pub fn first_content(self) -> Option<String> {
        self.choices?.into_iter().next()?.message.content
    }
}

// Body of POST /api/chat
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ChatTurn {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

// Body of POST /api/tone
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ToneRewrite {
    pub text: String,
    pub tone: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct Reply {
    pub reply: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
}

// Queued completion call - request + channel for the worker's answer
pub struct BatchedRequest {
    pub request: CompletionRequest,
    pub response_tx: oneshot::Sender<Result<String, GatewayError>>,
}
