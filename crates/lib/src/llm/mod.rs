//! LLM backends used by the completion provider.
//!
//! Each backend takes a list of chat messages and returns the assistant's text. Two are
//! supported: an OpenAI-compatible `/chat/completions` endpoint and a local Ollama instance.

mod ollama;
mod openai;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use ollama::OllamaClient;
pub use openai::OpenAiClient;

/// One chat message (role + content) sent to a backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    #[serde(default)]
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("llm request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("llm api error: {0}")]
    Api(String),
    #[error("llm credentials missing: {0}")]
    MissingCredentials(String),
}

/// A chat-completion backend: messages in, assistant text out.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Short backend name for logs (e.g. "openai").
    fn name(&self) -> &str;

    /// Non-streaming chat completion. Returns the assistant message content.
    async fn chat(&self, model: &str, messages: Vec<ChatMessage>) -> Result<String, LlmError>;
}
