//! Chat channel plumbing.
//!
//! Inbound bot activities arrive on `/api/messages`; replies go back to the caller-supplied
//! `serviceUrl` through the connector client. Delivery is best effort.

mod bot_framework;
mod inbound;

pub use bot_framework::{Activity, ChannelAccount, ConnectorClient, ConnectorError, ConversationRef};
pub use inbound::InboundMessage;
