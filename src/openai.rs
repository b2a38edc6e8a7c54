use crate::config::Config;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a completion call produced no text.
///
/// Each variant maps to exactly one user-visible notice.
#[derive(Debug, Error)]
pub enum CompletionError {
    /// The provider rejected the request shape (HTTP 400)
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The provider is throttling us (HTTP 429)
    #[error("rate limit exceeded: {0}")]
    RateLimited(String),

    /// The provider could not be reached
    #[error("connection error: {0}")]
    Connection(String),

    /// Anything else: other statuses, undecodable bodies, empty answers
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl CompletionError {
    /// Short category name used in logs
    pub fn category(&self) -> &'static str {
        match self {
            CompletionError::InvalidRequest(_) => "invalid-request",
            CompletionError::RateLimited(_) => "rate-limited",
            CompletionError::Connection(_) => "connection-error",
            CompletionError::Unexpected(_) => "unexpected",
        }
    }

    fn from_status(status: StatusCode, body: String) -> Self {
        let detail = format!("OpenAI API error ({}): {}", status, body);
        match status {
            StatusCode::BAD_REQUEST => CompletionError::InvalidRequest(detail),
            StatusCode::TOO_MANY_REQUESTS => CompletionError::RateLimited(detail),
            _ => CompletionError::Unexpected(detail),
        }
    }

    fn from_transport(error: reqwest::Error) -> Self {
        if error.is_connect() || error.is_timeout() || error.is_request() {
            CompletionError::Connection(error.to_string())
        } else {
            CompletionError::Unexpected(error.to_string())
        }
    }
}

/// Chat message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// OpenAI Chat Completion request
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// A chat completion service.
///
/// Implementations run deterministically (temperature 0) and never retry.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, messages: &[Message]) -> Result<String, CompletionError>;
}

/// OpenAI chat completions over HTTP
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(client: reqwest::Client, config: &Config) -> Self {
        Self {
            client,
            api_url: config.openai_api_url.clone(),
            api_key: config.openai_api_key.clone(),
            model: config.openai_model.clone(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl CompletionProvider for OpenAiClient {
    async fn complete(&self, messages: &[Message]) -> Result<String, CompletionError> {
        let request = ChatRequest {
            model: &self.model,
            messages,
            temperature: 0.0,
        };

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(CompletionError::from_transport)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<failed to read body: {}>", e));
            return Err(CompletionError::from_status(status, body));
        }

        let chat_response: ChatResponse = response.json().await.map_err(|e| {
            CompletionError::Unexpected(format!("Failed to parse OpenAI response: {}", e))
        })?;

        chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| {
                CompletionError::Unexpected("OpenAI response contained no choices".to_string())
            })
    }
}
