//! Relay client: POST one A2A request to a peer and parse its reply.

use crate::a2a::protocol::{A2aRequest, A2aResponse, A2A_PATH};
use async_trait::async_trait;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// Connection refused, DNS failure, timeout, or a body that could not be read.
    #[error("peer unreachable: {0}")]
    Unreachable(String),
    /// Peer answered with a non-success status.
    #[error("peer returned status {0}")]
    Status(u16),
}

/// Sends a message to a peer agent. One call, no retry.
#[async_trait]
pub trait PeerRelay: Send + Sync {
    async fn relay(
        &self,
        peer_base_url: &str,
        message: &str,
        caller_agent_id: &str,
    ) -> Result<A2aResponse, RelayError>;
}

/// HTTP relay client with a bounded per-request timeout.
#[derive(Clone)]
pub struct A2aRelayClient {
    client: reqwest::Client,
}

impl A2aRelayClient {
    pub fn new(timeout: Duration) -> Result<Self, RelayError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RelayError::Unreachable(e.to_string()))?;
        Ok(Self { client })
    }
}

/// `{base}/a2a`, ignoring trailing slashes on the base.
pub(crate) fn a2a_url(peer_base_url: &str) -> String {
    format!("{}{}", peer_base_url.trim().trim_end_matches('/'), A2A_PATH)
}

#[async_trait]
impl PeerRelay for A2aRelayClient {
    async fn relay(
        &self,
        peer_base_url: &str,
        message: &str,
        caller_agent_id: &str,
    ) -> Result<A2aResponse, RelayError> {
        let url = a2a_url(peer_base_url);
        let body = A2aRequest::new(message, caller_agent_id);
        log::debug!("relay: POST {} as {}", url, caller_agent_id);
        let res = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| RelayError::Unreachable(e.to_string()))?;
        let status = res.status();
        if !status.is_success() {
            return Err(RelayError::Status(status.as_u16()));
        }
        let text = res
            .text()
            .await
            .map_err(|e| RelayError::Unreachable(e.to_string()))?;
        Ok(A2aResponse::from_body(&text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_base_and_path() {
        assert_eq!(a2a_url("http://localhost:3979"), "http://localhost:3979/a2a");
        assert_eq!(a2a_url("http://localhost:3979/"), "http://localhost:3979/a2a");
        assert_eq!(a2a_url(" http://peer:1// "), "http://peer:1/a2a");
    }

    #[tokio::test]
    async fn refused_connection_is_unreachable() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let client = A2aRelayClient::new(Duration::from_secs(2)).unwrap();
        let err = client
            .relay(&format!("http://127.0.0.1:{}", port), "hi", "prime-agent")
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::Unreachable(_)));
    }
}
