pub mod multi_agent;
pub mod openai;

pub use openai::OpenAIClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

/// Model backend shared by the router and the fallback agent
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn generate_text(&self, messages: Vec<Message>) -> Result<String, String>;

    /// Single-turn inference with one user message
    async fn infer(&self, prompt: &str) -> Result<String, String> {
        self.generate_text(vec![Message::user(prompt)]).await
    }
}

#[async_trait]
impl LanguageModel for OpenAIClient {
    async fn generate_text(&self, messages: Vec<Message>) -> Result<String, String> {
        OpenAIClient::generate_text(self, messages).await
    }
}
