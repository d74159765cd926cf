//! Bot activity envelope and connector client.
//!
//! Activities are Bot Framework style JSON (`type`, `id`, `text`, `serviceUrl`, `conversation`,
//! `from`, `recipient`, `membersAdded`). Replies are POSTed to
//! `{serviceUrl}/v3/conversations/{conversation.id}/activities/{id}`.

use crate::channels::inbound::InboundMessage;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const MESSAGE_TYPE: &str = "message";
pub const CONVERSATION_UPDATE_TYPE: &str = "conversationUpdate";

const CONNECTOR_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelAccount {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationRef {
    #[serde(default)]
    pub id: String,
}

/// Inbound or outbound activity. Unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    #[serde(rename = "type")]
    pub typ: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    #[serde(default)]
    pub conversation: ConversationRef,
    #[serde(default)]
    pub from: ChannelAccount,
    #[serde(default)]
    pub recipient: ChannelAccount,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members_added: Vec<ChannelAccount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to_id: Option<String>,
}

impl Activity {
    pub fn is_message(&self) -> bool {
        self.typ.eq_ignore_ascii_case(MESSAGE_TYPE)
    }

    pub fn is_conversation_update(&self) -> bool {
        self.typ.eq_ignore_ascii_case(CONVERSATION_UPDATE_TYPE)
    }

    /// Message text as an inbound message for the router. Missing text reads as empty.
    pub fn inbound_message(&self) -> InboundMessage {
        InboundMessage::new(
            self.conversation.id.clone(),
            self.text.clone().unwrap_or_default(),
        )
    }

    /// Members added to the conversation other than the bot itself.
    pub fn added_users(&self) -> impl Iterator<Item = &ChannelAccount> {
        self.members_added
            .iter()
            .filter(move |m| m.id != self.recipient.id)
    }

    /// Reply activity: fresh id, same conversation, from/recipient swapped, threaded on this
    /// activity.
    pub fn reply(&self, text: impl Into<String>) -> Activity {
        Activity {
            typ: MESSAGE_TYPE.to_string(),
            id: Some(uuid::Uuid::new_v4().to_string()),
            text: Some(text.into()),
            service_url: None,
            channel_id: self.channel_id.clone(),
            conversation: self.conversation.clone(),
            from: self.recipient.clone(),
            recipient: self.from.clone(),
            members_added: Vec::new(),
            reply_to_id: self.id.clone(),
        }
    }

    /// Callback URL for replies to this activity. None when serviceUrl or conversation id is
    /// missing or serviceUrl is not a valid base URL.
    pub fn reply_url(&self) -> Option<String> {
        let service_url = self.service_url.as_deref()?.trim();
        if self.conversation.id.is_empty() {
            return None;
        }
        let mut url = reqwest::Url::parse(service_url).ok()?;
        {
            let mut segments = url.path_segments_mut().ok()?;
            segments
                .pop_if_empty()
                .extend(["v3", "conversations", self.conversation.id.as_str(), "activities"]);
            if let Some(id) = self.id.as_deref().filter(|id| !id.is_empty()) {
                segments.push(id);
            }
        }
        Some(url.to_string())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConnectorError {
    #[error("activity has no usable serviceUrl / conversation id")]
    NoCallback,
    #[error("connector request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("connector returned status {0}")]
    Status(u16),
}

/// Posts reply activities to the channel's callback URL.
#[derive(Clone)]
pub struct ConnectorClient {
    client: reqwest::Client,
}

impl ConnectorClient {
    pub fn new() -> Result<Self, ConnectorError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(CONNECTOR_TIMEOUT_SECS))
            .build()?;
        Ok(Self { client })
    }

    /// Send one text reply to the conversation `to` came from.
    pub async fn send_reply(&self, to: &Activity, text: &str) -> Result<(), ConnectorError> {
        let url = to.reply_url().ok_or(ConnectorError::NoCallback)?;
        let res = self.client.post(&url).json(&to.reply(text)).send().await?;
        if !res.status().is_success() {
            return Err(ConnectorError::Status(res.status().as_u16()));
        }
        Ok(())
    }

    /// Send replies in order. Failures are logged and the remaining replies are still attempted.
    pub async fn send_replies(&self, to: &Activity, replies: &[String]) {
        for text in replies {
            if let Err(e) = self.send_reply(to, text).await {
                log::warn!(
                    "connector: reply to conversation {} failed: {}",
                    to.conversation.id,
                    e
                );
            }
        }
    }
}
