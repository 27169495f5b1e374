use clap::Parser; // for cli
use std::sync::Arc;

use tinylm_gateway::cli::ChatLoop;
use tinylm_gateway::client::CompletionClient;
use tinylm_gateway::config::{Args, Command};
use tinylm_gateway::handlers::router;
use tinylm_gateway::logging::init_logging;
use tinylm_gateway::rate_limit::RateGate;
use tinylm_gateway::state::AppState;

// this is main async function with tokio
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // parse cli arguments
    let args = Args::parse();
    init_logging(args.log_json);

    if args.api_key.is_empty() {
        tracing::warn!("OPENROUTER_API_KEY is not set; the completion API will reject requests");
    }

    // One gate per process, shared by every call site
    let gate = Arc::new(RateGate::new(args.policies()?)?);
    for policy in gate.policies() {
        tracing::info!(%policy, "rate window configured");
    }

    match args.command {
        Command::Chat => {
            let client = CompletionClient::new(args.client_config("TinyLM Chatbot"))?;
            let chat = ChatLoop::new(gate, client, args.settings());
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            chat.run(stdin, tokio::io::stdout()).await?;
        }
        Command::Serve { port } => {
            let client = CompletionClient::new(args.client_config("TinyLM Web Gateway"))?;
            let state = AppState::start(gate, client, args.settings());
            let app = router(state);

            let addr = format!("0.0.0.0:{}", port);
            let listener = tokio::net::TcpListener::bind(&addr).await?;

            tracing::info!("Gateway running on http://localhost:{}", port);
            tracing::info!("Forwarding to {}", args.api_url);
            tracing::info!(chat_model = %args.model, tone_model = %args.tone_model, "models");
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}
