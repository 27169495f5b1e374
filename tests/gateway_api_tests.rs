use mockito::{Matcher, Server};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use tinylm_gateway::client::{ClientConfig, CompletionClient};
use tinylm_gateway::config::CompletionSettings;
use tinylm_gateway::handlers::router;
use tinylm_gateway::models::{ErrorBody, Reply};
use tinylm_gateway::rate_limit::{RateGate, WindowPolicy};
use tinylm_gateway::state::AppState;

fn settings() -> CompletionSettings {
    CompletionSettings {
        chat_model: "test/chat-model".to_string(),
        tone_model: "test/tone-model".to_string(),
        temperature: 0.7,
        chat_max_tokens: 1000,
        tone_max_tokens: 500,
    }
}

fn completion(content: &str) -> String {
    json!({ "choices": [ { "message": { "role": "assistant", "content": content } } ] }).to_string()
}

async fn spawn_gateway(upstream: &str, policies: Vec<WindowPolicy>) -> (String, Arc<AppState>) {
    let client = CompletionClient::new(ClientConfig {
        api_url: format!("{}/chat", upstream),
        api_key: "test-key".to_string(),
        referer: "https://example.test".to_string(),
        title: "Gateway Test".to_string(),
        timeout: Duration::from_secs(5),
    })
    .unwrap();
    let gate = Arc::new(RateGate::new(policies).unwrap());
    let state = AppState::start(gate, client, settings());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = router(state.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), state)
}

fn per_minute(count: u32) -> Vec<WindowPolicy> {
    vec![WindowPolicy::per_seconds(count, 60).unwrap()]
}

#[tokio::test]
async fn chat_reply_is_sanitized() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/chat")
        .match_header("authorization", "Bearer test-key")
        .match_header("x-title", "Gateway Test")
        .match_header("http-referer", "https://example.test")
        .match_body(Matcher::PartialJson(json!({
            "model": "test/chat-model",
            "max_tokens": 1000
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(completion(
            "What is the capital of France? Paris is the capital of France.\nQ: And Spain?",
        ))
        .expect(1)
        .create_async()
        .await;

    let (base, _state) = spawn_gateway(&server.url(), per_minute(10)).await;
    let res = reqwest::Client::new()
        .post(format!("{}/api/chat", base))
        .json(&json!({ "message": "What is the capital of France?" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    let reply: Reply = res.json().await.unwrap();
    assert_eq!(reply.reply, "Paris is the capital of France.");
    assert_eq!(reply.session_id, None);
    mock.assert_async().await;
}

#[tokio::test]
async fn denied_requests_never_reach_upstream() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/chat")
        .with_status(200)
        .with_body(completion("Sure."))
        .expect(2)
        .create_async()
        .await;

    let (base, _state) = spawn_gateway(&server.url(), per_minute(2)).await;
    let http = reqwest::Client::new();

    for _ in 0..2 {
        let res = http
            .post(format!("{}/api/chat", base))
            .json(&json!({ "message": "hi" }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 200);
    }

    let res = http
        .post(format!("{}/api/tone", base))
        .json(&json!({ "text": "hi", "tone": "formal" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 429);
    assert!(res.headers().contains_key("retry-after"));
    let body: ErrorBody = res.json().await.unwrap();
    assert_eq!(
        body.error,
        "Rate limit exceeded. Please wait a moment before trying again."
    );

    mock.assert_async().await;
}

#[tokio::test]
async fn upstream_error_message_is_passed_through() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/chat")
        .with_status(401)
        .with_body(json!({ "error": { "message": "No auth credentials found", "code": 401 } }).to_string())
        .create_async()
        .await;

    let (base, _state) = spawn_gateway(&server.url(), per_minute(10)).await;
    let res = reqwest::Client::new()
        .post(format!("{}/api/chat", base))
        .json(&json!({ "message": "hello" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 502);
    let body: ErrorBody = res.json().await.unwrap();
    assert_eq!(body.error, "API Error: No auth credentials found");
}

#[tokio::test]
async fn response_without_choices_is_malformed() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/chat")
        .with_status(200)
        .with_body(r#"{"choices": []}"#)
        .create_async()
        .await;

    let (base, _state) = spawn_gateway(&server.url(), per_minute(10)).await;
    let res = reqwest::Client::new()
        .post(format!("{}/api/chat", base))
        .json(&json!({ "message": "hello" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 502);
    let body: ErrorBody = res.json().await.unwrap();
    assert!(body.error.starts_with("Error: "));
}

#[tokio::test]
async fn session_history_is_sent_and_can_be_forgotten() {
    let mut server = Server::new_async().await;
    let first = server
        .mock("POST", "/chat")
        .with_status(200)
        .with_body(completion("Hello! Nice to meet"))
        .expect(1)
        .create_async()
        .await;

    let (base, state) = spawn_gateway(&server.url(), per_minute(10)).await;
    let http = reqwest::Client::new();

    let reply: Reply = http
        .post(format!("{}/api/chat", base))
        .json(&json!({ "message": "Hi", "session_id": "abc" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(reply.reply, "Hello!");
    assert_eq!(reply.session_id.as_deref(), Some("abc"));
    first.assert_async().await;
    first.remove_async().await;

    // The stored turn carries the sanitized reply, not the raw one
    let second = server
        .mock("POST", "/chat")
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r#""role":"user","content":"Hi""#.to_string()),
            Matcher::Regex(r#""role":"assistant","content":"Hello!""#.to_string()),
            Matcher::Regex(r#""role":"user","content":"How are you\?""#.to_string()),
        ]))
        .with_status(200)
        .with_body(completion("Fine, thanks."))
        .expect(1)
        .create_async()
        .await;

    let reply: Reply = http
        .post(format!("{}/api/chat", base))
        .json(&json!({ "message": "How are you?", "session_id": "abc" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(reply.reply, "Fine, thanks.");
    second.assert_async().await;
    assert_eq!(state.history("abc").len(), 4);

    let res = http.delete(format!("{}/api/chat/abc", base)).send().await.unwrap();
    assert_eq!(res.status(), 204);
    let res = http.delete(format!("{}/api/chat/abc", base)).send().await.unwrap();
    assert_eq!(res.status(), 404);
    assert!(state.history("abc").is_empty());
}

#[tokio::test]
async fn tone_rewrite_uses_tone_prompt_and_model() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/chat")
        .match_body(Matcher::AllOf(vec![
            Matcher::PartialJson(json!({ "model": "test/tone-model", "max_tokens": 500 })),
            Matcher::Regex(r"Rewrite text in a Playful tone \(fun and lighthearted\)\.".to_string()),
        ]))
        .with_status(200)
        .with_body(completion("  Oops, the bus zoomed off without me!  "))
        .expect(1)
        .create_async()
        .await;

    let (base, _state) = spawn_gateway(&server.url(), per_minute(10)).await;
    let reply: Reply = reqwest::Client::new()
        .post(format!("{}/api/tone", base))
        .json(&json!({ "text": "I missed the bus.", "tone": "Playful" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(reply.reply, "Oops, the bus zoomed off without me!");
    mock.assert_async().await;
}

#[tokio::test]
async fn concurrent_requests_respect_quota() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/chat")
        .with_status(200)
        .with_body(completion("Ok."))
        .expect(5)
        .create_async()
        .await;

    let (base, _state) = spawn_gateway(&server.url(), per_minute(5)).await;
    let http = reqwest::Client::new();

    let tasks: Vec<_> = (0..20)
        .map(|i| {
            let http = http.clone();
            let url = format!("{}/api/chat", base);
            tokio::spawn(async move {
                http.post(url)
                    .json(&json!({ "message": format!("question {}", i) }))
                    .send()
                    .await
                    .unwrap()
                    .status()
                    .as_u16()
            })
        })
        .collect();

    let mut ok = 0;
    let mut limited = 0;
    for task in tasks {
        match task.await.unwrap() {
            200 => ok += 1,
            429 => limited += 1,
            other => panic!("unexpected status {}", other),
        }
    }
    assert_eq!(ok, 5);
    assert_eq!(limited, 15);
    mock.assert_async().await;
}

#[tokio::test]
async fn health_reports_window_usage() {
    let server = Server::new_async().await;
    let policies = vec![
        WindowPolicy::per_seconds(10, 60).unwrap(),
        WindowPolicy::per_seconds(100, 86_400).unwrap(),
    ];
    let (base, state) = spawn_gateway(&server.url(), policies).await;
    assert!(state.gate.try_admit().is_admitted());

    let health: serde_json::Value = reqwest::get(format!("{}/health", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(health["status"], "healthy");
    assert_eq!(health["rate_windows"][0]["in_window"], 1);
    assert_eq!(health["rate_windows"][1]["max_count"], 100);
    assert_eq!(health["rate_windows"][1]["duration_secs"], 86_400);
}

#[tokio::test]
async fn examples_and_metrics_are_served() {
    let server = Server::new_async().await;
    let (base, _state) = spawn_gateway(&server.url(), per_minute(10)).await;

    let examples: serde_json::Value = reqwest::get(format!("{}/api/examples", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(examples["chat"].as_array().unwrap().len(), 4);
    assert_eq!(examples["tone"][0]["tone"], "sad");

    let metrics = reqwest::get(format!("{}/metrics", base))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(metrics.contains("tinylm_upstream_latency_seconds"));
}
