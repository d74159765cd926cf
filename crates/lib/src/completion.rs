//! Completion provider: one language-model call per normal-mode message.
//!
//! Wraps an [`LlmBackend`] with a fixed coding-assistant prompt. Any failure (missing key,
//! network error, empty output) is logged and turned into [`Completion::Fallback`], so callers
//! always get text to show the user.

use crate::config::{self, CompletionBackend, Config};
use crate::llm::{ChatMessage, LlmBackend, OllamaClient, OpenAiClient};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

const SYSTEM_ROLE: &str = "You are a helpful coding assistant.";

const PROMPT_TEMPLATE: &str = "Analyze the user's request and provide helpful programming advice, \
code snippets, or explanations. Be concise but thorough. Format your response nicely for chat.

User request: {input}";

/// Shown when no completion could be produced.
pub const FALLBACK_REPLY: &str =
    "I can help you with coding questions and agent communication. Say `agent` to start agent-to-agent mode.";

const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";
const DEFAULT_OLLAMA_MODEL: &str = "llama3.2:latest";

/// Outcome of a completion: generated text, or the static fallback with the reason it was used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    Generated(String),
    Fallback { reason: String },
}

impl Completion {
    /// Text to show the user.
    pub fn text(&self) -> &str {
        match self {
            Completion::Generated(text) => text,
            Completion::Fallback { .. } => FALLBACK_REPLY,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Completion::Fallback { .. })
    }
}

/// Produces a reply for a user prompt. Never fails; see [`Completion`].
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, prompt: &str) -> Completion;

    /// True when a backend is wired up (reported by the health endpoint).
    fn enabled(&self) -> bool {
        true
    }
}

/// Build the user message from the fixed template.
pub fn render_prompt(input: &str) -> String {
    PROMPT_TEMPLATE.replace("{input}", input)
}

/// Messages sent to the backend for one prompt: system role, then the rendered user message.
pub fn prompt_messages(input: &str) -> Vec<ChatMessage> {
    vec![ChatMessage::system(SYSTEM_ROLE), ChatMessage::user(render_prompt(input))]
}

/// Completion provider backed by an LLM. With no backend every call falls back.
pub struct LlmCompletion {
    backend: Option<Arc<dyn LlmBackend>>,
    model: String,
}

impl LlmCompletion {
    pub fn new(backend: Option<Arc<dyn LlmBackend>>, model: impl Into<String>) -> Self {
        Self {
            backend,
            model: model.into(),
        }
    }

    /// Build from config: picks the backend and resolves model, base URL and key.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let c = &config.completion;
        let timeout = Duration::from_secs(c.timeout_secs.max(1));
        let model = c
            .model
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string);
        let (backend, model): (Option<Arc<dyn LlmBackend>>, String) = match c.backend {
            CompletionBackend::Openai => {
                let api_key = config::resolve_api_key(config);
                if api_key.is_none() {
                    log::warn!("completion: no OpenAI API key configured; replies will use the fallback text");
                }
                let client = OpenAiClient::new(c.base_url.clone(), api_key, timeout)?;
                (
                    Some(Arc::new(client)),
                    model.unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
                )
            }
            CompletionBackend::Ollama => {
                let client = OllamaClient::new(c.base_url.clone(), timeout)?;
                (
                    Some(Arc::new(client)),
                    model.unwrap_or_else(|| DEFAULT_OLLAMA_MODEL.to_string()),
                )
            }
            CompletionBackend::None => (None, String::new()),
        };
        Ok(Self::new(backend, model))
    }
}

#[async_trait]
impl CompletionProvider for LlmCompletion {
    async fn complete(&self, prompt: &str) -> Completion {
        let Some(backend) = self.backend.as_ref() else {
            return Completion::Fallback {
                reason: "no completion backend configured".to_string(),
            };
        };
        log::debug!("completion: {} model {}", backend.name(), self.model);
        match backend.chat(&self.model, prompt_messages(prompt)).await {
            Ok(text) if !text.trim().is_empty() => Completion::Generated(text),
            Ok(_) => {
                log::warn!("completion: {} returned empty content", backend.name());
                Completion::Fallback {
                    reason: "empty completion".to_string(),
                }
            }
            Err(e) => {
                log::warn!("completion: {} failed: {}", backend.name(), e);
                Completion::Fallback {
                    reason: e.to_string(),
                }
            }
        }
    }

    fn enabled(&self) -> bool {
        self.backend.is_some()
    }
}
