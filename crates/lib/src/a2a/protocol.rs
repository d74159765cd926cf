//! A2A wire types. All JSON field names are camelCase.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const PROTOCOL_NAME: &str = "A2A";
pub const PROTOCOL_VERSION: &str = "1.0";

pub const A2A_PATH: &str = "/a2a";
pub const AGENT_CARD_PATH: &str = "/agent-card";
pub const MESSAGES_PATH: &str = "/api/messages";
pub const ECHO_PATH: &str = "/api/echo";
pub const HEALTH_PATH: &str = "/api/health";

/// Request body for `POST /a2a`: `{ "message", "agentId", "timestamp" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct A2aRequest {
    pub message: String,
    #[serde(default)]
    pub agent_id: String,
    /// RFC 3339 UTC.
    #[serde(default)]
    pub timestamp: String,
}

impl A2aRequest {
    /// New request stamped with the current time.
    pub fn new(message: impl Into<String>, agent_id: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            agent_id: agent_id.into(),
            timestamp: now_rfc3339(),
        }
    }
}

/// Response body for `POST /a2a`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct A2aResponse {
    #[serde(default)]
    pub agent_name: String,
    #[serde(default)]
    pub protocol: String,
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub capabilities: Vec<String>,
}

impl A2aResponse {
    /// Response from this agent, stamped now.
    pub fn reply(agent_name: &str, response: impl Into<String>, capabilities: &[&str]) -> Self {
        Self {
            agent_name: agent_name.to_string(),
            protocol: PROTOCOL_NAME.to_string(),
            response: response.into(),
            timestamp: now_rfc3339(),
            version: PROTOCOL_VERSION.to_string(),
            capabilities: capabilities.iter().map(|c| c.to_string()).collect(),
        }
    }

    /// Parse a peer's reply body without failing.
    ///
    /// A JSON object is read field by field: missing or non-string fields become "" and
    /// non-string capabilities are skipped. When `response` is missing, a `message` field
    /// (the `/api/echo` shape) is used instead. Anything that is not a JSON object becomes the
    /// response text as-is.
    pub fn from_body(body: &str) -> Self {
        let obj = match serde_json::from_str::<Value>(body) {
            Ok(Value::Object(obj)) => obj,
            _ => {
                return Self {
                    response: body.to_string(),
                    ..Self::default()
                }
            }
        };
        let text = |key: &str| {
            obj.get(key)
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_string()
        };
        let response = match obj.get("response").and_then(Value::as_str) {
            Some(r) => r.to_string(),
            None => text("message"),
        };
        let capabilities = obj
            .get("capabilities")
            .and_then(Value::as_array)
            .map(|caps| {
                caps.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        Self {
            agent_name: text("agentName"),
            protocol: text("protocol"),
            response,
            timestamp: text("timestamp"),
            version: text("version"),
            capabilities,
        }
    }
}

/// Endpoint paths advertised in the agent card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentEndpoints {
    pub a2a: String,
    pub agent_card: String,
    pub messages: String,
    pub health: String,
}

impl Default for AgentEndpoints {
    fn default() -> Self {
        Self {
            a2a: A2A_PATH.to_string(),
            agent_card: AGENT_CARD_PATH.to_string(),
            messages: MESSAGES_PATH.to_string(),
            health: HEALTH_PATH.to_string(),
        }
    }
}

/// Static capability descriptor served at `GET /agent-card`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentCard {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub protocol: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub endpoints: AgentEndpoints,
}

impl AgentCard {
    pub fn new(name: &str, description: &str, capabilities: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            protocol: PROTOCOL_NAME.to_string(),
            version: PROTOCOL_VERSION.to_string(),
            capabilities: capabilities.iter().map(|c| c.to_string()).collect(),
            endpoints: AgentEndpoints::default(),
        }
    }
}

pub(crate) fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}
