use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

use crate::client::CompletionClient;
use crate::config::CompletionSettings;
use crate::error::GatewayError;
use crate::metrics::{self, ACTIVE_SESSIONS};
use crate::models::{BatchedRequest, ChatMessage, CompletionRequest};
use crate::rate_limit::RateGate;
use crate::sanitize::Sanitizer;
use crate::worker::{QUEUE_CAPACITY, completion_worker};

// Oldest turns are dropped beyond this many stored messages per session
pub const MAX_HISTORY_MESSAGES: usize = 20;

// app's shared state
pub struct AppState {
    pub gate: Arc<RateGate>,
    pub sanitizer: Sanitizer,
    pub settings: CompletionSettings,
    pub sessions: DashMap<String, Vec<ChatMessage>>, // session id -> history
    batch_tx: mpsc::Sender<BatchedRequest>,
}

impl AppState {
    /// Build the state and spawn the completion worker that owns `client`.
    /// Must be called from within a tokio runtime.
    pub fn start(
        gate: Arc<RateGate>,
        client: CompletionClient,
        settings: CompletionSettings,
    ) -> Arc<Self> {
        metrics::init();
        let (batch_tx, batch_rx) = mpsc::channel::<BatchedRequest>(QUEUE_CAPACITY);
        tokio::spawn(completion_worker(batch_rx, client));

        Arc::new(Self {
            gate,
            sanitizer: Sanitizer::default(),
            settings,
            sessions: DashMap::new(),
            batch_tx,
        })
    }

    // Queue a completion call and wait for the worker's answer
    pub async fn complete(&self, request: CompletionRequest) -> Result<String, GatewayError> {
        let (response_tx, response_rx) = oneshot::channel();
        let batched = BatchedRequest {
            request,
            response_tx,
        };

        self.batch_tx
            .send(batched)
            .await
            .map_err(|_| GatewayError::QueueClosed)?;

        response_rx.await.map_err(|_| GatewayError::QueueClosed)?
    }

    pub fn history(&self, session_id: &str) -> Vec<ChatMessage> {
        self.sessions
            .get(session_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    pub fn record_turn(&self, session_id: &str, user: ChatMessage, assistant: ChatMessage) {
        let mut history = self.sessions.entry(session_id.to_string()).or_default();
        history.push(user);
        history.push(assistant);
        if history.len() > MAX_HISTORY_MESSAGES {
            let excess = history.len() - MAX_HISTORY_MESSAGES;
            history.drain(..excess);
        }
        drop(history);
        ACTIVE_SESSIONS.set(self.sessions.len() as f64);
    }

    pub fn forget(&self, session_id: &str) -> bool {
        let removed = self.sessions.remove(session_id).is_some();
        ACTIVE_SESSIONS.set(self.sessions.len() as f64);
        removed
    }
}
