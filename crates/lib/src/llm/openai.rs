//! OpenAI-compatible chat client (`POST {base}/chat/completions`, bearer key).

use crate::llm::{ChatMessage, LlmBackend, LlmError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Client for an OpenAI-compatible API. The key is optional so a missing key surfaces
/// as `LlmError::MissingCredentials` at call time instead of failing startup.
#[derive(Clone)]
pub struct OpenAiClient {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl OpenAiClient {
    pub fn new(
        base_url: Option<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let base_url = base_url
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url,
            api_key,
            client,
        })
    }
}

#[async_trait]
impl LlmBackend for OpenAiClient {
    fn name(&self) -> &str {
        "openai"
    }

    async fn chat(&self, model: &str, messages: Vec<ChatMessage>) -> Result<String, LlmError> {
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| LlmError::MissingCredentials("set OPENAI_API_KEY or completion.apiKey".to_string()))?;
        let url = format!("{}/chat/completions", self.base_url);
        let body = OpenAiChatRequest {
            model: model.to_string(),
            messages,
            stream: false,
        };
        let res = self
            .client
            .post(&url)
            .bearer_auth(key)
            .json(&body)
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(LlmError::Api(format!("{} {}", status, body)));
        }
        let data: OpenAiChatResponse = res.json().await?;
        Ok(first_choice_content(data))
    }
}

#[derive(Debug, Serialize)]
struct OpenAiChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct OpenAiChatResponse {
    choices: Option<Vec<OpenAiChoice>>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: Option<OpenAiResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
}

fn first_choice_content(data: OpenAiChatResponse) -> String {
    data.choices
        .and_then(|c| c.into_iter().next())
        .and_then(|c| c.message)
        .and_then(|m| m.content)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_choice_content_takes_first_message() {
        let data: OpenAiChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"use a Vec"}},{"message":{"content":"other"}}]}"#,
        )
        .unwrap();
        assert_eq!(first_choice_content(data), "use a Vec");
    }

    #[test]
    fn first_choice_content_empty_when_no_choices() {
        let data: OpenAiChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert_eq!(first_choice_content(data), "");
        let data: OpenAiChatResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(first_choice_content(data), "");
    }

    #[tokio::test]
    async fn missing_key_fails_without_request() {
        let client = OpenAiClient::new(
            Some("http://127.0.0.1:9".to_string()),
            None,
            Duration::from_secs(1),
        )
        .unwrap();
        let err = client
            .chat("gpt-3.5-turbo", vec![ChatMessage::user("hi")])
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::MissingCredentials(_)));
    }
}
