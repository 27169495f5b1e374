use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::client::CompletionClient;
use crate::config::CompletionSettings;
use crate::error::GatewayError;
use crate::models::{ChatMessage, CompletionRequest};
use crate::rate_limit::RateGate;
use crate::sanitize::Sanitizer;

// Pause after a denial so a held-down Enter key doesn't spin
pub const DENIAL_BACKOFF: Duration = Duration::from_secs(2);

/// Terminal chat: one prompt per line, one completion per prompt.
pub struct ChatLoop {
    gate: Arc<RateGate>,
    client: CompletionClient,
    sanitizer: Sanitizer,
    settings: CompletionSettings,
    denial_backoff: Duration,
}

impl ChatLoop {
    pub fn new(gate: Arc<RateGate>, client: CompletionClient, settings: CompletionSettings) -> Self {
        Self {
            gate,
            client,
            sanitizer: Sanitizer::default(),
            settings,
            denial_backoff: DENIAL_BACKOFF,
        }
    }

    pub fn with_denial_backoff(mut self, backoff: Duration) -> Self {
        self.denial_backoff = backoff;
        self
    }

    pub async fn run<R, W>(&self, input: R, mut output: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let limits = self
            .gate
            .policies()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        output.write_all(b"=== TinyLM Chat ===\n").await?;
        output
            .write_all(format!("Note: Rate limited to {}\n", limits).as_bytes())
            .await?;
        output.write_all(b"Type 'exit' to quit\n\n").await?;
        output.flush().await?;

        let mut lines = input.lines();
        loop {
            output.write_all(b"You: ").await?;
            output.flush().await?;

            let Some(line) = lines.next_line().await? else {
                break;
            };
            let prompt = line.trim();
            if prompt.eq_ignore_ascii_case("exit") {
                output.write_all(b"Goodbye!\n").await?;
                break;
            }
            if prompt.is_empty() {
                continue;
            }

            match self.ask(prompt).await {
                Ok(reply) => {
                    output
                        .write_all(format!("\nAssistant: {}\n\n", reply).as_bytes())
                        .await?;
                }
                Err(GatewayError::QuotaExceeded(denial)) => {
                    output
                        .write_all(format!("\n{}\n\n", denial.message()).as_bytes())
                        .await?;
                    output.flush().await?;
                    tokio::time::sleep(self.denial_backoff).await;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "chat turn failed");
                    output.write_all(format!("{}\n", e).as_bytes()).await?;
                }
            }
            output.flush().await?;
        }

        output.flush().await
    }

    // Gate first: a denied prompt never reaches the network
    pub async fn ask(&self, prompt: &str) -> Result<String, GatewayError> {
        self.gate.check()?;

        let request = CompletionRequest {
            model: self.settings.chat_model.clone(),
            messages: vec![ChatMessage::user(prompt)],
            temperature: self.settings.temperature,
            max_tokens: self.settings.chat_max_tokens,
        };
        let raw = self.client.complete(&request).await?;
        Ok(self.sanitizer.sanitize(&raw, prompt))
    }
}
