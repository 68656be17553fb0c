use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::config::AgentConfig;
use crate::error::CollaboratorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }
}

/// The understanding step: role-tagged messages in, free text out.
#[async_trait]
pub trait Collaborator: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage], max_tokens: u32) -> Result<String, CollaboratorError>;
}

#[derive(Clone)]
pub struct LLMService {
    client: Client,
    base_url: String,
    model: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    options: ChatOptions,
}

#[derive(Serialize)]
struct ChatOptions {
    num_predict: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ChatMessage,
}

impl LLMService {
    pub fn new(config: &AgentConfig) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(config.request_timeout_secs))
                .build()
                .unwrap_or_default(),
            base_url: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        }
    }
}

#[async_trait]
impl Collaborator for LLMService {
    async fn complete(&self, messages: &[ChatMessage], max_tokens: u32) -> Result<String, CollaboratorError> {
        let request_body = ChatRequest {
            model: &self.model,
            messages,
            stream: false,
            options: ChatOptions { num_predict: max_tokens },
        };

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&request_body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(CollaboratorError::Status(response.status()));
        }

        let reply: ChatResponse = response.json().await?;
        debug!("Collaborator replied: {}", reply.message.content);
        Ok(reply.message.content.trim().to_string())
    }
}
