//! Helpers for integration tests: free ports, starting agents, and a callback capture server
//! standing in for the bot channel's serviceUrl.

#![allow(dead_code)]

use a2a::config::{CompletionBackend, Config};
use a2a::gateway;
use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

pub fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind free port");
    listener.local_addr().expect("local_addr").port()
}

/// Config with both agents on free ports, PrimeAgent pointed at SecondaryAgent, no LLM backend.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.prime.port = free_port();
    config.secondary.port = free_port();
    while config.secondary.port == config.prime.port {
        config.secondary.port = free_port();
    }
    config.prime.peer.url = format!("http://127.0.0.1:{}", config.secondary.port);
    config.prime.peer.timeout_secs = 2;
    config.completion.backend = CompletionBackend::None;
    config
}

pub fn prime_url(config: &Config) -> String {
    format!("http://127.0.0.1:{}", config.prime.port)
}

pub fn secondary_url(config: &Config) -> String {
    format!("http://127.0.0.1:{}", config.secondary.port)
}

/// Poll GET {base}/api/health until it answers 200 (5s max).
pub async fn wait_ready(base: &str) {
    let url = format!("{}/api/health", base);
    let client = reqwest::Client::new();
    let mut last_err = None;
    for _ in 0..100 {
        match client.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => return,
            Ok(_) => {}
            Err(e) => last_err = Some(e),
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("{} not ready within 5s; last error: {:?}", url, last_err);
}

/// Start SecondaryAgent in the background and wait until it serves. The task is left running.
pub async fn start_secondary(config: &Config) -> String {
    let c = config.clone();
    tokio::spawn(async move {
        let _ = gateway::run_secondary(c).await;
    });
    let url = secondary_url(config);
    wait_ready(&url).await;
    url
}

/// Start PrimeAgent in the background and wait until it serves.
pub async fn start_prime(config: &Config) -> String {
    let c = config.clone();
    tokio::spawn(async move {
        let _ = gateway::run_prime(c).await;
    });
    let url = prime_url(config);
    wait_ready(&url).await;
    url
}

/// Records every activity POSTed under /v3/conversations/.
#[derive(Clone, Default)]
pub struct Callbacks {
    received: Arc<Mutex<Vec<Value>>>,
}

impl Callbacks {
    /// Wait until at least `n` activities arrived (5s max) and return them all.
    pub async fn wait_for(&self, n: usize) -> Vec<Value> {
        for _ in 0..100 {
            {
                let got = self.received.lock().await;
                if got.len() >= n {
                    return got.clone();
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        let got = self.received.lock().await;
        panic!("expected {} callbacks, got {}: {:?}", n, got.len(), *got);
    }

    /// Wait until `conversation` has at least `n` replies (5s max) and return their texts.
    pub async fn wait_for_conversation(&self, conversation: &str, n: usize) -> Vec<String> {
        for _ in 0..250 {
            let texts = self.conversation_texts(conversation).await;
            if texts.len() >= n {
                return texts;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        let texts = self.conversation_texts(conversation).await;
        panic!("expected {} replies in {}, got {:?}", n, conversation, texts);
    }

    /// Texts of the activities received for one conversation, in arrival order.
    pub async fn conversation_texts(&self, conversation: &str) -> Vec<String> {
        self.received
            .lock()
            .await
            .iter()
            .filter(|a| a["conversation"]["id"] == conversation)
            .map(|a| a["text"].as_str().unwrap_or("").to_string())
            .collect()
    }

    /// Texts of all received activities so far.
    pub async fn texts(&self) -> Vec<String> {
        self.received
            .lock()
            .await
            .iter()
            .map(|a| a["text"].as_str().unwrap_or("").to_string())
            .collect()
    }
}

async fn capture(State(callbacks): State<Callbacks>, Json(activity): Json<Value>) -> StatusCode {
    callbacks.received.lock().await.push(activity);
    StatusCode::OK
}

/// Start the capture server; returns its base URL (the serviceUrl for test activities).
pub async fn start_callback_server() -> (String, Callbacks) {
    let callbacks = Callbacks::default();
    let app = Router::new()
        .route("/v3/conversations/*rest", post(capture))
        .with_state(callbacks.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind callback server");
    let addr = listener.local_addr().expect("local_addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{}", addr), callbacks)
}

/// Peer that accepts connections and never answers. Returns its base URL.
pub async fn start_silent_peer() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind silent peer");
    let addr = listener.local_addr().expect("local_addr");
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    format!("http://{}", addr)
}

/// Bot message activity for `conversation` with a fresh id.
pub fn message_activity(service_url: &str, conversation: &str, text: &str) -> Value {
    json!({
        "type": "message",
        "id": uuid::Uuid::new_v4().to_string(),
        "text": text,
        "serviceUrl": service_url,
        "channelId": "test",
        "conversation": { "id": conversation },
        "from": { "id": "user-1", "name": "Tester" },
        "recipient": { "id": "bot-1", "name": "Agent" }
    })
}

/// POST an activity to {base}/api/messages and assert the empty 200 acknowledgement.
pub async fn post_activity(base: &str, activity: &Value) {
    let resp = reqwest::Client::new()
        .post(format!("{}/api/messages", base))
        .json(activity)
        .send()
        .await
        .expect("post activity");
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    assert!(resp.text().await.expect("body").is_empty());
}
