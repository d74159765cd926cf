//! PrimeAgent: coding assistant that answers with the completion provider and, in forwarding
//! mode, relays messages to the peer agent.

use crate::a2a::{A2aRelayClient, A2aResponse, AgentCard, A2A_PATH, AGENT_CARD_PATH, HEALTH_PATH, MESSAGES_PATH};
use crate::channels::{ConnectorClient, InboundMessage};
use crate::completion::{CompletionProvider, LlmCompletion};
use crate::config::{self, Config};
use crate::gateway::server::{self, ActivityDispatcher, ActivityHandler};
use crate::routing::{MessageRouter, PeerTarget};
use crate::session::ConversationModeStore;
use anyhow::Result;
use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::State,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use std::time::Duration;

const CAPABILITIES: &[&str] = &["code-assistance", "agent-forwarding", "a2a-communication"];

const DESCRIPTION: &str = "Coding assistant that can forward conversations to a peer agent";

fn welcome_text(name: &str, peer: &str) -> String {
    format!(
        "👋 Hello! I'm **{}**, a code agent that can:\n\n\
         • 💻 **Help with coding questions** and programming advice\n\
         • 🤖 **Communicate with other agents** for advanced workflows\n\n\
         **Quick Start:**\n\
         • Ask me any coding question\n\
         • Say `agent` to start agent-to-agent communication\n\
         • I can forward your messages to {} for analysis!",
        name, peer
    )
}

/// Shared state for PrimeAgent handlers.
#[derive(Clone)]
struct PrimeState {
    name: String,
    card: Arc<AgentCard>,
    completion: Arc<dyn CompletionProvider>,
    activities: ActivityDispatcher,
}

struct PrimeBot {
    router: Arc<MessageRouter>,
    welcome: String,
}

#[async_trait]
impl ActivityHandler for PrimeBot {
    fn welcome(&self) -> String {
        self.welcome.clone()
    }

    async fn on_message(&self, msg: &InboundMessage) -> Vec<String> {
        self.router.handle(msg).await
    }
}

/// Run PrimeAgent on config.prime.bind:config.prime.port. Blocks until shutdown (e.g. Ctrl+C).
pub async fn run_prime(config: Config) -> Result<()> {
    let prime = &config.prime;
    let peer = PeerTarget {
        base_url: config::resolve_peer_url(&config),
        name: prime.peer.name.clone(),
    };
    let idle_ttl = prime.mode_idle_ttl();
    let modes = Arc::new(ConversationModeStore::with_idle_ttl(idle_ttl));
    let completion: Arc<dyn CompletionProvider> = Arc::new(LlmCompletion::from_config(&config)?);
    let relay = A2aRelayClient::new(Duration::from_secs(prime.peer.timeout_secs.max(1)))?;
    log::info!(
        "{}: peer {} at {} (timeout {}s)",
        prime.name,
        peer.name,
        peer.base_url,
        prime.peer.timeout_secs.max(1)
    );

    let router = Arc::new(MessageRouter::new(
        modes.clone(),
        completion.clone(),
        Arc::new(relay),
        peer.clone(),
        prime.agent_id.clone(),
    ));
    let bot = PrimeBot {
        router,
        welcome: welcome_text(&prime.name, &peer.name),
    };
    let activities = ActivityDispatcher::new(Arc::new(bot), ConnectorClient::new()?);

    if let Some(ttl) = idle_ttl {
        let modes = modes.clone();
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(ttl);
            loop {
                tick.tick().await;
                let evicted = modes.evict_idle().await;
                if evicted > 0 {
                    log::info!("evicted {} idle forwarding conversation(s)", evicted);
                }
            }
        });
    }

    let state = PrimeState {
        name: prime.name.clone(),
        card: Arc::new(AgentCard::new(&prime.name, DESCRIPTION, CAPABILITIES)),
        completion,
        activities,
    };
    let app = Router::new()
        .route("/", get(banner))
        .route(A2A_PATH, post(a2a))
        .route(AGENT_CARD_PATH, get(agent_card))
        .route(MESSAGES_PATH, post(messages))
        .route(HEALTH_PATH, get(health))
        .with_state(state);

    server::serve(app, &prime.name, &prime.bind, prime.port).await
}

/// GET /: plaintext banner.
async fn banner(State(state): State<PrimeState>) -> String {
    server::banner(&state.name)
}

/// POST /a2a: answer a peer's message with the completion provider.
async fn a2a(State(state): State<PrimeState>, body: Bytes) -> Response {
    let req = match server::decode_a2a(&body) {
        Ok(r) => r,
        Err(res) => return res,
    };
    let from = if req.agent_id.is_empty() {
        "unknown agent"
    } else {
        req.agent_id.as_str()
    };
    log::info!("{}: a2a message from {}", state.name, from);
    let completion = state.completion.complete(&req.message).await;
    Json(A2aResponse::reply(&state.name, completion.text(), CAPABILITIES)).into_response()
}

/// GET /agent-card
async fn agent_card(State(state): State<PrimeState>) -> Json<AgentCard> {
    Json(state.card.as_ref().clone())
}

/// POST /api/messages: accept a bot activity; replies go to its serviceUrl.
async fn messages(State(state): State<PrimeState>, body: Bytes) -> Response {
    state.activities.dispatch(&body)
}

/// GET /api/health
async fn health(State(state): State<PrimeState>) -> Json<crate::gateway::HealthResponse> {
    Json(server::health(state.completion.enabled()))
}
