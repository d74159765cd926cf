//! SecondaryAgent: echoes messages back over `/a2a`, `/api/echo` and bot activities.

use crate::a2a::{
    A2aResponse, AgentCard, A2A_PATH, AGENT_CARD_PATH, ECHO_PATH, HEALTH_PATH, MESSAGES_PATH,
};
use crate::channels::{ConnectorClient, InboundMessage};
use crate::config::Config;
use crate::echo::{self, EchoCounter, EchoError};
use crate::gateway::protocol::{EchoRequest, HealthResponse};
use crate::gateway::server::{self, ActivityDispatcher, ActivityHandler};
use anyhow::Result;
use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;

const CAPABILITIES: &[&str] = &["echo", "a2a-communication"];

const DESCRIPTION: &str = "Echo agent that returns every message it receives";

const EMPTY_MESSAGE_REPLY: &str = "[Empty message received]";

#[derive(Clone)]
struct SecondaryState {
    name: String,
    card: Arc<AgentCard>,
    counter: Arc<EchoCounter>,
    activities: ActivityDispatcher,
}

struct EchoBot {
    name: String,
    counter: Arc<EchoCounter>,
}

#[async_trait]
impl ActivityHandler for EchoBot {
    fn welcome(&self) -> String {
        format!(
            "Hello! I'm {} - I simply echo back whatever you send me.",
            self.name
        )
    }

    async fn on_message(&self, msg: &InboundMessage) -> Vec<String> {
        let text = msg.text.trim();
        match echo::echo(&self.counter, text) {
            Ok(reply) => vec![reply.message],
            Err(EchoError::Empty) => vec![EMPTY_MESSAGE_REPLY.to_string()],
        }
    }
}

/// Run SecondaryAgent on config.secondary.bind:config.secondary.port. Blocks until shutdown.
pub async fn run_secondary(config: Config) -> Result<()> {
    let secondary = &config.secondary;
    let counter = Arc::new(EchoCounter::new());
    let bot = EchoBot {
        name: secondary.name.clone(),
        counter: counter.clone(),
    };
    let activities = ActivityDispatcher::new(Arc::new(bot), ConnectorClient::new()?);

    let state = SecondaryState {
        name: secondary.name.clone(),
        card: Arc::new(AgentCard::new(&secondary.name, DESCRIPTION, CAPABILITIES)),
        counter,
        activities,
    };
    let app = Router::new()
        .route("/", get(banner))
        .route(A2A_PATH, post(a2a))
        .route(AGENT_CARD_PATH, get(agent_card))
        .route(ECHO_PATH, post(echo_http))
        .route(MESSAGES_PATH, post(messages))
        .route(HEALTH_PATH, get(health))
        .with_state(state);

    server::serve(app, &secondary.name, &secondary.bind, secondary.port).await
}

async fn banner(State(state): State<SecondaryState>) -> String {
    server::banner(&state.name)
}

/// POST /a2a: echo the message verbatim in `response`.
async fn a2a(State(state): State<SecondaryState>, body: Bytes) -> Response {
    let req = match server::decode_a2a(&body) {
        Ok(r) => r,
        Err(res) => return res,
    };
    match echo::echo(&state.counter, &req.message) {
        Ok(reply) => {
            log::info!("{}: a2a echo #{} for {}", state.name, reply.message_count, req.agent_id);
            Json(A2aResponse::reply(&state.name, reply.message, CAPABILITIES)).into_response()
        }
        Err(e) => server::json_error(StatusCode::BAD_REQUEST, e.to_string()),
    }
}

/// POST /api/echo: `{message}` -> `{message, messageCount}`, 400 when empty or missing.
async fn echo_http(State(state): State<SecondaryState>, body: Bytes) -> Response {
    let req: EchoRequest = match server::decode(&body) {
        Ok(r) => r,
        Err(res) => return res,
    };
    let message = req.message.unwrap_or_default();
    match echo::echo(&state.counter, &message) {
        Ok(reply) => Json(reply).into_response(),
        Err(e) => server::json_error(StatusCode::BAD_REQUEST, e.to_string()),
    }
}

async fn agent_card(State(state): State<SecondaryState>) -> Json<AgentCard> {
    Json(state.card.as_ref().clone())
}

async fn messages(State(state): State<SecondaryState>, body: Bytes) -> Response {
    state.activities.dispatch(&body)
}

async fn health(State(_state): State<SecondaryState>) -> Json<HealthResponse> {
    Json(server::health(false))
}
