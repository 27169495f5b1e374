use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};

use crate::error::GatewayError;
use crate::models::{CompletionRequest, CompletionResponse};

pub const DEFAULT_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_REFERER: &str = "https://github.com/your-username/your-repo";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: String,
    pub api_key: String,
    // Caller-identifying headers expected by the API
    pub referer: String,
    pub title: String,
    pub timeout: Duration,
}

/// Thin client for the remote chat-completion endpoint. Returns the raw text of
/// the first choice; cleaning it up is the caller's job.
#[derive(Clone)]
pub struct CompletionClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl CompletionClient {
    pub fn new(config: ClientConfig) -> Result<Self, GatewayError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Ok(referer) = HeaderValue::from_str(&config.referer) {
            headers.insert("http-referer", referer);
        }
        if let Ok(title) = HeaderValue::from_str(&config.title) {
            headers.insert("x-title", title);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self { http, config })
    }

    pub async fn complete(&self, request: &CompletionRequest) -> Result<String, GatewayError> {
        tracing::debug!(
            model = %request.model,
            messages = request.messages.len(),
            "calling completion API"
        );

        let res = self
            .http
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(request)
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        let parsed = serde_json::from_str::<CompletionResponse>(&body);
        match parsed {
            // An error payload wins over the status code
            Ok(CompletionResponse { error: Some(error), .. }) => {
                tracing::warn!(%status, message = %error.message, "completion API returned an error");
                Err(GatewayError::Upstream(error.message))
            }
            _ if !status.is_success() => {
                tracing::warn!(%status, "completion API request failed");
                Err(GatewayError::Upstream(format!("HTTP {}", status)))
            }
            Ok(response) => response.first_content().ok_or_else(|| {
                GatewayError::MalformedResponse("response contained no completion".to_string())
            }),
            Err(e) => Err(GatewayError::MalformedResponse(format!("Parse Error: {}", e))),
        }
    }
}
