//! A2A protocol: JSON messages exchanged between agents over `POST /a2a`, the static agent
//! card, and the relay client used while a conversation is in forwarding mode.

mod protocol;
mod relay;

pub use protocol::{
    A2aRequest, A2aResponse, AgentCard, AgentEndpoints, A2A_PATH, AGENT_CARD_PATH, ECHO_PATH,
    HEALTH_PATH, MESSAGES_PATH, PROTOCOL_NAME, PROTOCOL_VERSION,
};
pub use relay::{A2aRelayClient, PeerRelay, RelayError};
