//! Inbound message from a channel: delivered to the agent for routing.

use crate::session::ConversationId;

/// One user message: conversation it belongs to and its text. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub conversation_id: ConversationId,
    pub text: String,
}

impl InboundMessage {
    pub fn new(conversation_id: impl Into<ConversationId>, text: impl Into<String>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            text: text.into(),
        }
    }
}
