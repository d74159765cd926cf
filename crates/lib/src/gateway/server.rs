//! Shared server plumbing: listener + graceful shutdown, health, JSON errors, and bot
//! activity dispatch.

use crate::a2a::{A2aRequest, PROTOCOL_VERSION};
use crate::channels::{Activity, ConnectorClient, InboundMessage};
use crate::gateway::protocol::{ErrorBody, HealthResponse};
use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::{
    body::Bytes,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json, Router,
};
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Agent-specific reactions to bot activities.
#[async_trait]
pub(crate) trait ActivityHandler: Send + Sync + 'static {
    /// Greeting sent to each user added to a conversation.
    fn welcome(&self) -> String;

    /// Replies for one message activity, in send order.
    async fn on_message(&self, msg: &InboundMessage) -> Vec<String>;
}

/// Hands each accepted activity to its own task; replies go out through the connector.
#[derive(Clone)]
pub(crate) struct ActivityDispatcher {
    handler: Arc<dyn ActivityHandler>,
    connector: ConnectorClient,
}

impl ActivityDispatcher {
    pub(crate) fn new(handler: Arc<dyn ActivityHandler>, connector: ConnectorClient) -> Self {
        Self { handler, connector }
    }

    /// POST /api/messages body handling: decode, spawn processing, acknowledge with an empty 200.
    /// Activities are handled independently; a slow relay in one conversation does not hold up
    /// another.
    pub(crate) fn dispatch(&self, body: &Bytes) -> Response {
        let activity: Activity = match decode(body) {
            Ok(a) => a,
            Err(res) => return res,
        };
        let handler = self.handler.clone();
        let connector = self.connector.clone();
        tokio::spawn(async move {
            process_activity(handler.as_ref(), &connector, activity).await;
        });
        StatusCode::OK.into_response()
    }
}

async fn process_activity(handler: &dyn ActivityHandler, connector: &ConnectorClient, activity: Activity) {
    if activity.is_message() {
        let msg = activity.inbound_message();
        let replies = handler.on_message(&msg).await;
        connector.send_replies(&activity, &replies).await;
    } else if activity.is_conversation_update() {
        let welcome = handler.welcome();
        for member in activity.added_users() {
            log::debug!("welcoming {} to conversation {}", member.id, activity.conversation.id);
            if let Err(e) = connector.send_reply(&activity, &welcome).await {
                log::warn!("welcome to conversation {} failed: {}", activity.conversation.id, e);
            }
        }
    } else {
        log::debug!("ignoring activity of type {}", activity.typ);
    }
}

/// Decode a JSON body or produce the 400 response for it.
pub(crate) fn decode<T: DeserializeOwned>(body: &Bytes) -> Result<T, Response> {
    serde_json::from_slice(body).map_err(|e| {
        log::debug!("rejecting request body: {}", e);
        json_error(StatusCode::BAD_REQUEST, format!("invalid request body: {}", e))
    })
}

/// Decode an A2A request; empty message is a 400 like a malformed body.
pub(crate) fn decode_a2a(body: &Bytes) -> Result<A2aRequest, Response> {
    let req: A2aRequest = decode(body)?;
    if req.message.trim().is_empty() {
        return Err(json_error(StatusCode::BAD_REQUEST, "Message cannot be empty"));
    }
    Ok(req)
}

pub(crate) fn json_error(status: StatusCode, error: impl Into<String>) -> Response {
    (status, Json(ErrorBody::new(error))).into_response()
}

pub(crate) fn health(completion_enabled: bool) -> HealthResponse {
    HealthResponse {
        status: "healthy".to_string(),
        framework: "axum".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        semantic_kernel: if completion_enabled { "enabled" } else { "disabled" }.to_string(),
        a2a_protocol: PROTOCOL_VERSION.to_string(),
    }
}

pub(crate) fn banner(name: &str) -> String {
    format!("{} is running and ready for agent-to-agent messaging!", name)
}

/// Bind and serve until Ctrl+C / SIGTERM.
pub(crate) async fn serve(app: Router, name: &str, bind: &str, port: u16) -> Result<()> {
    let bind_addr = format!("{}:{}", bind.trim(), port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding to {}", bind_addr))?;
    log::info!("{} listening on {}", name, bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .with_context(|| format!("{} server exited", name))?;
    log::info!("{} stopped", name);
    Ok(())
}

/// Completes when the process should shut down (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::warn!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                log::warn!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received, draining connections");
}
