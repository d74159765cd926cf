//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.a2a-agents/config.json`) and environment.
//! Both agents read the same file; each uses its own section plus the shared completion settings.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// PrimeAgent settings (bind, port, peer, mode store).
    #[serde(default)]
    pub prime: PrimeConfig,

    /// SecondaryAgent settings.
    #[serde(default)]
    pub secondary: SecondaryConfig,

    /// Language-model backend used by PrimeAgent.
    #[serde(default)]
    pub completion: CompletionConfig,
}

/// PrimeAgent: HTTP listener, identity, and the peer it forwards to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrimeConfig {
    /// Bind address (default "127.0.0.1").
    #[serde(default = "default_bind")]
    pub bind: String,

    /// HTTP port (default 3978).
    #[serde(default = "default_prime_port")]
    pub port: u16,

    /// Display name used in agent card, banner and A2A responses.
    #[serde(default = "default_prime_name")]
    pub name: String,

    /// Sent as `agentId` on outbound A2A requests.
    #[serde(default = "default_prime_agent_id")]
    pub agent_id: String,

    /// When set, a forwarding conversation idle longer than this reverts to normal mode.
    /// Unset means entries are kept until the user sends `end`.
    #[serde(default)]
    pub mode_idle_ttl_secs: Option<u64>,

    #[serde(default)]
    pub peer: PeerConfig,
}

/// Peer agent reached over `/a2a` while a conversation is in forwarding mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerConfig {
    /// Base URL of the peer (default "http://localhost:3979"). Overridden by A2A_PEER_URL env.
    #[serde(default = "default_peer_url")]
    pub url: String,

    /// Name shown to the user in forwarding replies.
    #[serde(default = "default_secondary_name")]
    pub name: String,

    /// Upper bound for one relay round trip.
    #[serde(default = "default_peer_timeout_secs")]
    pub timeout_secs: u64,
}

/// SecondaryAgent: HTTP listener and identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecondaryConfig {
    /// Bind address (default "127.0.0.1").
    #[serde(default = "default_bind")]
    pub bind: String,

    /// HTTP port (default 3979).
    #[serde(default = "default_secondary_port")]
    pub port: u16,

    #[serde(default = "default_secondary_name")]
    pub name: String,
}

/// Which completion backend PrimeAgent calls for normal-mode messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionBackend {
    /// OpenAI-compatible `/chat/completions` with a bearer key.
    #[default]
    Openai,
    /// Local Ollama `/api/chat`.
    Ollama,
    /// No backend; every normal-mode message gets the static fallback reply.
    None,
}

/// Completion backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionConfig {
    #[serde(default)]
    pub backend: CompletionBackend,

    /// Model id passed as-is to the backend. When absent the backend default is used
    /// ("gpt-3.5-turbo" for openai, "llama3.2:latest" for ollama).
    #[serde(default)]
    pub model: Option<String>,

    /// Backend base URL. When absent the backend default is used.
    #[serde(default)]
    pub base_url: Option<String>,

    /// API key for the openai backend. Overridden by OPENAI_API_KEY env.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_completion_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_prime_port() -> u16 {
    3978
}

fn default_secondary_port() -> u16 {
    3979
}

fn default_prime_name() -> String {
    "PrimeAgent".to_string()
}

fn default_secondary_name() -> String {
    "SecondaryAgent".to_string()
}

fn default_prime_agent_id() -> String {
    "prime-agent".to_string()
}

fn default_peer_url() -> String {
    "http://localhost:3979".to_string()
}

fn default_peer_timeout_secs() -> u64 {
    10
}

fn default_completion_timeout_secs() -> u64 {
    30
}

impl Default for PrimeConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_prime_port(),
            name: default_prime_name(),
            agent_id: default_prime_agent_id(),
            mode_idle_ttl_secs: None,
            peer: PeerConfig::default(),
        }
    }
}

impl PrimeConfig {
    /// Idle TTL for forwarding conversations. Unset or 0 means no eviction.
    pub fn mode_idle_ttl(&self) -> Option<Duration> {
        self.mode_idle_ttl_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

impl Default for PeerConfig {
    fn default() -> Self {
        Self {
            url: default_peer_url(),
            name: default_secondary_name(),
            timeout_secs: default_peer_timeout_secs(),
        }
    }
}

impl Default for SecondaryConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_secondary_port(),
            name: default_secondary_name(),
        }
    }
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            backend: CompletionBackend::default(),
            model: None,
            base_url: None,
            api_key: None,
            timeout_secs: default_completion_timeout_secs(),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.and_then(|s| {
        let t = s.trim();
        if t.is_empty() {
            None
        } else {
            Some(t.to_string())
        }
    })
}

/// Resolve the peer base URL: env A2A_PEER_URL overrides config. Trailing slashes are dropped.
pub fn resolve_peer_url(config: &Config) -> String {
    peer_url_with_override(config, std::env::var("A2A_PEER_URL").ok())
}

fn peer_url_with_override(config: &Config, env_url: Option<String>) -> String {
    non_empty(env_url)
        .unwrap_or_else(|| config.prime.peer.url.trim().to_string())
        .trim_end_matches('/')
        .to_string()
}

/// Resolve the completion API key: env OPENAI_API_KEY overrides config.
pub fn resolve_api_key(config: &Config) -> Option<String> {
    api_key_with_override(config, std::env::var("OPENAI_API_KEY").ok())
}

fn api_key_with_override(config: &Config, env_key: Option<String>) -> Option<String> {
    non_empty(env_key).or_else(|| non_empty(config.completion.api_key.clone()))
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("A2A_CONFIG_PATH").map(PathBuf::from).unwrap_or_else(|_| {
        dirs::home_dir()
            .map(|h| h.join(".a2a-agents").join("config.json"))
            .unwrap_or_else(|| PathBuf::from("config.json"))
    })
}

/// Load config from the given path, or the default path (A2A_CONFIG_PATH or ~/.a2a-agents/config.json).
/// Missing file => default config. Returns the config and the path that was used.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    Ok((config, path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_ports_and_names() {
        let config = Config::default();
        assert_eq!(config.prime.port, 3978);
        assert_eq!(config.secondary.port, 3979);
        assert_eq!(config.prime.bind, "127.0.0.1");
        assert_eq!(config.prime.peer.url, "http://localhost:3979");
        assert_eq!(config.prime.peer.name, "SecondaryAgent");
        assert_eq!(config.prime.peer.timeout_secs, 10);
        assert_eq!(config.prime.mode_idle_ttl_secs, None);
        assert_eq!(config.completion.backend, CompletionBackend::Openai);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: Config = serde_json::from_str(
            r#"{ "prime": { "port": 4000, "peer": { "url": "http://peer:9000/" } },
                 "completion": { "backend": "ollama", "model": "qwen3:8b" } }"#,
        )
        .unwrap();
        assert_eq!(config.prime.port, 4000);
        assert_eq!(config.prime.agent_id, "prime-agent");
        assert_eq!(config.prime.peer.url, "http://peer:9000/");
        assert_eq!(config.prime.peer.timeout_secs, 10);
        assert_eq!(config.secondary.port, 3979);
        assert_eq!(config.completion.backend, CompletionBackend::Ollama);
        assert_eq!(config.completion.model.as_deref(), Some("qwen3:8b"));
    }

    #[test]
    fn peer_url_env_overrides_config() {
        let mut config = Config::default();
        config.prime.peer.url = "http://from-config:3979/".to_string();
        assert_eq!(peer_url_with_override(&config, None), "http://from-config:3979");
        assert_eq!(
            peer_url_with_override(&config, Some(" http://from-env:4000/ ".to_string())),
            "http://from-env:4000"
        );
        assert_eq!(
            peer_url_with_override(&config, Some("   ".to_string())),
            "http://from-config:3979"
        );
    }

    #[test]
    fn api_key_env_takes_precedence_and_blank_is_unset() {
        let mut config = Config::default();
        assert_eq!(api_key_with_override(&config, None), None);
        assert_eq!(api_key_with_override(&config, Some("".to_string())), None);

        config.completion.api_key = Some(" sk-config ".to_string());
        assert_eq!(api_key_with_override(&config, None).as_deref(), Some("sk-config"));
        assert_eq!(
            api_key_with_override(&config, Some("sk-env".to_string())).as_deref(),
            Some("sk-env")
        );
        assert_eq!(
            api_key_with_override(&config, Some("  ".to_string())).as_deref(),
            Some("sk-config")
        );

        config.completion.api_key = Some("  ".to_string());
        assert_eq!(api_key_with_override(&config, None), None);
    }

    #[test]
    fn mode_idle_ttl_zero_means_unset() {
        let mut prime = PrimeConfig::default();
        assert_eq!(prime.mode_idle_ttl(), None);
        prime.mode_idle_ttl_secs = Some(0);
        assert_eq!(prime.mode_idle_ttl(), None);
        prime.mode_idle_ttl_secs = Some(90);
        assert_eq!(prime.mode_idle_ttl(), Some(Duration::from_secs(90)));
    }

    #[test]
    fn missing_file_uses_defaults() {
        let path = std::env::temp_dir().join(format!("a2a-missing-{}.json", uuid::Uuid::new_v4()));
        let (config, used) = load_config(Some(path.clone())).unwrap();
        assert_eq!(used, path);
        assert_eq!(config.prime.port, 3978);
    }

    #[test]
    fn invalid_file_is_an_error() {
        let path = std::env::temp_dir().join(format!("a2a-invalid-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, b"{ not json").unwrap();
        assert!(load_config(Some(path.clone())).is_err());
        let _ = std::fs::remove_file(path);
    }
}
