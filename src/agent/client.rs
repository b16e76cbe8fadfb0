//! Chat-completion client for the external LLM agent.
//!
//! Talks to any OpenAI-compatible `/chat/completions` endpoint. The
//! agent is opaque to the rest of the crate: it receives a prompt and
//! the selected tables, and returns free text.

use crate::config::AgentSettings;
use crate::error::{AgentError, AgentErrorKind};
use crate::models::Table;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// A capability that answers a prompt about a set of tables.
#[async_trait]
pub trait TableAgent: Send + Sync {
    /// Submit `prompt` together with the `tables` it refers to.
    async fn ask(&self, prompt: &str, tables: &[&Table]) -> Result<String, AgentError>;

    /// Model identifier, for display.
    fn model(&self) -> &str;
}

/// Message in the chat request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Chat completions request body.
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

/// Chat completions response body.
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Agent backed by an OpenAI-compatible HTTP API.
pub struct ChatCompletionAgent {
    api_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    timeout_seconds: Option<u64>,
    http_client: reqwest::Client,
}

impl ChatCompletionAgent {
    /// Build an agent from settings and a credential.
    pub fn new(settings: &AgentSettings, api_key: &str) -> Result<Self, AgentError> {
        info!(
            "Initializing agent with model {} at {}",
            settings.model, settings.api_url
        );

        let mut builder = reqwest::Client::builder();
        if let Some(secs) = settings.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http_client = builder.build().map_err(|e| {
            AgentError::new(
                AgentErrorKind::Request,
                format!("Failed to create HTTP client: {}", e),
            )
        })?;

        Ok(Self {
            api_url: settings.api_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: settings.model.clone(),
            temperature: settings.temperature,
            timeout_seconds: settings.timeout_seconds,
            http_client,
        })
    }

    fn map_send_error(&self, e: reqwest::Error) -> AgentError {
        if e.is_timeout() {
            AgentError::new(
                AgentErrorKind::Timeout,
                format!(
                    "Request timed out after {}s",
                    self.timeout_seconds.unwrap_or_default()
                ),
            )
        } else if e.is_connect() {
            AgentError::new(
                AgentErrorKind::Connect,
                format!("Cannot connect to LLM API at {}", self.api_url),
            )
        } else {
            AgentError::new(
                AgentErrorKind::Request,
                format!("Failed to send request: {}", e),
            )
        }
    }
}

#[async_trait]
impl TableAgent for ChatCompletionAgent {
    async fn ask(&self, prompt: &str, tables: &[&Table]) -> Result<String, AgentError> {
        let url = format!("{}/chat/completions", self.api_url);

        let request = ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
            temperature: self.temperature,
        };

        debug!(
            "Sending prompt of {} chars over {} table(s) to {}",
            prompt.len(),
            tables.len(),
            url
        );

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::new(
                AgentErrorKind::Status,
                format!("LLM API error {}: {}", status, body),
            ));
        }

        let completion: ChatCompletionResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                self.map_send_error(e)
            } else {
                AgentError::new(
                    AgentErrorKind::MalformedResponse,
                    format!("Failed to parse LLM response: {}", e),
                )
            }
        })?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| {
                AgentError::new(
                    AgentErrorKind::MalformedResponse,
                    "LLM response contained no answer",
                )
            })
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// System prompt sent with every question.
const SYSTEM_PROMPT: &str = r#"You are a data analyst answering questions about Brazilian electronic invoices (notas fiscais).
You are given the invoice tables as CSV. Compute answers from the data provided.
Answer concisely, in the language of the question, and state the figures you relied on."#;

#[cfg(test)]
mod tests {
    use super::*;

    fn settings_for(url: &str) -> AgentSettings {
        AgentSettings {
            api_url: url.to_string(),
            ..AgentSettings::default()
        }
    }

    #[tokio::test]
    async fn test_ask_returns_message_content() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[{"message":{"role":"assistant","content":"ACME LTDA"}}]}"#)
            .create_async()
            .await;

        let agent = ChatCompletionAgent::new(&settings_for(&server.url()), "sk-test").unwrap();
        let answer = agent.ask("Who sold the most?", &[]).await.unwrap();

        assert_eq!(answer, "ACME LTDA");
        assert_eq!(agent.model(), "gpt-3.5-turbo");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_ask_maps_http_error_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(429)
            .with_body("quota exceeded")
            .create_async()
            .await;

        let agent = ChatCompletionAgent::new(&settings_for(&server.url()), "sk-test").unwrap();
        let err = agent.ask("anything", &[]).await.unwrap_err();

        assert_eq!(err.kind, AgentErrorKind::Status);
        assert!(err.message.contains("429"));
        assert!(err.message.contains("quota exceeded"));
    }

    #[tokio::test]
    async fn test_ask_rejects_empty_choices() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[]}"#)
            .create_async()
            .await;

        let agent = ChatCompletionAgent::new(&settings_for(&server.url()), "sk-test").unwrap();
        let err = agent.ask("anything", &[]).await.unwrap_err();

        assert_eq!(err.kind, AgentErrorKind::MalformedResponse);
    }

    #[tokio::test]
    async fn test_ask_rejects_non_json_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body("<html>gateway</html>")
            .create_async()
            .await;

        let agent = ChatCompletionAgent::new(&settings_for(&server.url()), "sk-test").unwrap();
        let err = agent.ask("anything", &[]).await.unwrap_err();

        assert_eq!(err.kind, AgentErrorKind::MalformedResponse);
    }

    #[test]
    fn test_api_url_trailing_slash_is_trimmed() {
        let agent =
            ChatCompletionAgent::new(&settings_for("http://localhost:1234/v1/"), "k").unwrap();
        assert_eq!(agent.api_url, "http://localhost:1234/v1");
    }
}
