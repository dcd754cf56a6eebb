//! Chat-completion client abstraction

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::Settings;
use crate::prompts::ReviewRequest;
use crate::Result;

mod openai;

pub use openai::OpenAiClient;

/// Role tag of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
}

/// One role-tagged conversation turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// Body of a chat-completions request
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub stream: bool,
}

impl ChatRequest {
    /// Build a non-streaming request with the system turn first
    pub fn new(settings: &Settings, review: &ReviewRequest) -> Self {
        Self {
            model: settings.model.clone(),
            messages: vec![
                ChatMessage::system(review.system.clone()),
                ChatMessage::user(review.user.clone()),
            ],
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
            stream: false,
        }
    }

    /// Content of the first message with the given role
    pub fn content_of(&self, role: ChatRole) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.role == role)
            .map(|m| m.content.as_str())
    }
}

/// Trait for hosted chat-completion services
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Get the name of this client
    fn name(&self) -> &'static str;

    /// Send one request and return the completion text
    async fn complete(&self, request: &ChatRequest) -> Result<String>;
}
