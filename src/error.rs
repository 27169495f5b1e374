use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::models::ErrorBody;
use crate::rate_limit::{ConfigError, Denial};

/// Every way a gated completion call can fail. `Display` is the text shown to
/// the end user, so each variant reads as a finished message.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("{}", .0.message())]
    QuotaExceeded(Denial),

    #[error("API Error: {0}")]
    Upstream(String),

    #[error("Error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Error: {0}")]
    MalformedResponse(String),

    #[error("Error: completion worker is not running")]
    QueueClosed,

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl From<Denial> for GatewayError {
    fn from(denial: Denial) -> Self {
        GatewayError::QuotaExceeded(denial)
    }
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::QuotaExceeded(_) => StatusCode::TOO_MANY_REQUESTS,
            GatewayError::Upstream(_) | GatewayError::MalformedResponse(_) => {
                StatusCode::BAD_GATEWAY
            }
            GatewayError::Transport(e) if e.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
            GatewayError::Transport(_) => StatusCode::BAD_GATEWAY,
            GatewayError::QueueClosed => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let mut response = (status, Json(ErrorBody { error: self.to_string() })).into_response();

        if let GatewayError::QuotaExceeded(denial) = &self {
            let secs = denial.retry_after.as_secs().max(1);
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}
