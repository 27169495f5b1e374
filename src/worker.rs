use std::time::Instant;
use tokio::sync::mpsc;

use crate::client::CompletionClient;
use crate::error::GatewayError;
use crate::metrics::{REQUEST_LATENCY, UPSTREAM_FAILURES};
use crate::models::BatchedRequest;

// Queue depth between the handlers and the worker
pub const QUEUE_CAPACITY: usize = 100;

// Drains the queue and calls the completion API one request at a time
pub async fn completion_worker(mut rx: mpsc::Receiver<BatchedRequest>, client: CompletionClient) {
    tracing::info!("completion worker started - processing requests sequentially");

    while let Some(batched_req) = rx.recv().await {
        let start_time = Instant::now();
        let result = client.complete(&batched_req.request).await;
        REQUEST_LATENCY.observe(start_time.elapsed().as_secs_f64());

        if let Err(e) = &result {
            UPSTREAM_FAILURES.with_label_values(&[failure_kind(e)]).inc();
            tracing::warn!(error = %e, "completion failed");
        }

        // Handler may have gone away; nothing to do then
        let _ = batched_req.response_tx.send(result);
    }

    tracing::info!("completion worker stopped");
}

pub(crate) fn failure_kind(error: &GatewayError) -> &'static str {
    match error {
        GatewayError::Upstream(_) => "upstream",
        GatewayError::Transport(_) => "transport",
        GatewayError::MalformedResponse(_) => "malformed",
        _ => "other",
    }
}
