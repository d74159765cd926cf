//! Message router: per-conversation mode switch between local completion and peer relay.
//!
//! Normal: `agent` switches to forwarding, anything else goes to the completion provider.
//! Forwarding: `end` switches back, anything else is relayed to the peer agent.
//! Commands are matched case-insensitively after trimming. Blank input is rejected in any mode.

use crate::a2a::{PeerRelay, RelayError};
use crate::channels::InboundMessage;
use crate::completion::{Completion, CompletionProvider};
use crate::session::{ConversationMode, ConversationModeStore};
use std::sync::Arc;

/// Switches a normal conversation to forwarding.
pub const ACTIVATE_COMMAND: &str = "agent";
/// Switches a forwarding conversation back to normal.
pub const END_COMMAND: &str = "end";

pub const EMPTY_INPUT_REPLY: &str = "Please provide a message for me to process.";
pub const MODE_HINT_REPLY: &str =
    "💬 *Say `agent` to start an agent-to-agent conversation for specialized analysis.*";

/// Peer the router forwards to.
#[derive(Debug, Clone)]
pub struct PeerTarget {
    pub base_url: String,
    pub name: String,
}

/// Replies for one inbound message, in send order. Never empty.
pub type RouterReply = Vec<String>;

pub struct MessageRouter {
    modes: Arc<ConversationModeStore>,
    completion: Arc<dyn CompletionProvider>,
    relay: Arc<dyn PeerRelay>,
    peer: PeerTarget,
    agent_id: String,
}

impl MessageRouter {
    pub fn new(
        modes: Arc<ConversationModeStore>,
        completion: Arc<dyn CompletionProvider>,
        relay: Arc<dyn PeerRelay>,
        peer: PeerTarget,
        agent_id: impl Into<String>,
    ) -> Self {
        Self {
            modes,
            completion,
            relay,
            peer,
            agent_id: agent_id.into(),
        }
    }

    pub fn modes(&self) -> &Arc<ConversationModeStore> {
        &self.modes
    }

    /// Handle one message and return the replies to send back.
    pub async fn handle(&self, msg: &InboundMessage) -> RouterReply {
        let text = msg.text.trim();
        if text.is_empty() {
            return vec![EMPTY_INPUT_REPLY.to_string()];
        }
        let conversation_id = msg.conversation_id.as_str();
        let mode = self.modes.mode(conversation_id).await;
        log::info!(
            "router: conversation {} in {:?} mode, {} forwarding",
            conversation_id,
            mode,
            self.modes.len().await
        );
        match mode {
            ConversationMode::Normal if text.eq_ignore_ascii_case(ACTIVATE_COMMAND) => {
                if !self
                    .modes
                    .switch_mode(conversation_id, ConversationMode::Normal, ConversationMode::Forwarding)
                    .await
                {
                    // A concurrent `agent` already switched this conversation.
                    return self.forward(text).await;
                }
                log::info!("router: conversation {} now forwarding to {}", conversation_id, self.peer.name);
                self.activation_replies()
            }
            ConversationMode::Normal => self.complete(text).await,
            ConversationMode::Forwarding if text.eq_ignore_ascii_case(END_COMMAND) => {
                if !self
                    .modes
                    .switch_mode(conversation_id, ConversationMode::Forwarding, ConversationMode::Normal)
                    .await
                {
                    return self.complete(text).await;
                }
                log::info!("router: conversation {} back to normal", conversation_id);
                vec!["🔚 **Agent conversation ended.** I'm back to normal coding assistant mode!".to_string()]
            }
            ConversationMode::Forwarding => self.forward(text).await,
        }
    }

    fn activation_replies(&self) -> RouterReply {
        vec![
            format!(
                "🤖 **Agent-to-Agent Mode Activated!**\n\nI'll now forward your messages to the {} for specialized analysis.",
                self.peer.name
            ),
            format!(
                "✨ **Instructions:**\n• Type your message to communicate with {}\n• Say `{}` to return to normal mode",
                self.peer.name, END_COMMAND
            ),
        ]
    }

    async fn complete(&self, text: &str) -> RouterReply {
        match self.completion.complete(text).await {
            Completion::Generated(answer) => vec![
                format!("💡 **Code Assistant Response:**\n\n{}", answer),
                MODE_HINT_REPLY.to_string(),
            ],
            fallback @ Completion::Fallback { .. } => vec![fallback.text().to_string()],
        }
    }

    async fn forward(&self, text: &str) -> RouterReply {
        let notice = format!(
            "📤 **Forwarding your message to {}...**\n\n*Original Message:* \"{}\"",
            self.peer.name, text
        );
        let outcome = match self
            .relay
            .relay(&self.peer.base_url, text, &self.agent_id)
            .await
        {
            Ok(res) => format!("📥 **{} Response:**\n\n{}", self.peer.name, res.response),
            Err(RelayError::Status(code)) => {
                log::warn!("router: {} returned status {}", self.peer.name, code);
                format!(
                    "❌ Failed to communicate with {}. Status: {}\nMake sure {} is running at {}.",
                    self.peer.name, code, self.peer.name, self.peer.base_url
                )
            }
            Err(e) => {
                log::warn!("router: relay to {} failed: {}", self.peer.name, e);
                format!(
                    "❌ Error communicating with {}. Please ensure it's running.",
                    self.peer.name
                )
            }
        };
        vec![notice, outcome]
    }
}
