//! Conversation state and the chat completion seam.

use crate::error::{PodragError, Result};
use crate::openai::{create_client_with_timeout, OpenAIClient};
use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

/// Who said a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
}

/// A single message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: ChatRole::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: ChatRole::Assistant, content: content.into() }
    }
}

/// A chat completion service.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Complete a conversation, returning the assistant's reply.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String>;
}

/// Conversation memory owned by the caller.
///
/// Every answered exchange is kept for the life of the session; nothing is evicted.
#[derive(Debug, Clone, Default)]
pub struct ChatSession {
    history: Vec<ChatMessage>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    /// Messages to send for a new user turn: the history followed by `prompt`.
    pub fn messages_with(&self, prompt: &str) -> Vec<ChatMessage> {
        let mut messages = self.history.clone();
        messages.push(ChatMessage::user(prompt));
        messages
    }

    /// Append a completed exchange.
    pub fn record(&mut self, user: impl Into<String>, assistant: impl Into<String>) {
        self.history.push(ChatMessage::user(user));
        self.history.push(ChatMessage::assistant(assistant));
    }

    pub fn reset(&mut self) {
        self.history.clear();
    }

    /// Number of stored messages.
    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}

/// Chat completions through the OpenAI API.
pub struct OpenAIChat {
    client: OpenAIClient,
    model: String,
}

impl OpenAIChat {
    /// Create a chat model client with a request timeout.
    pub fn new(model: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: create_client_with_timeout(timeout)?,
            model: model.to_string(),
        })
    }

    fn to_request_message(message: &ChatMessage) -> Result<ChatCompletionRequestMessage> {
        let content = message.content.clone();
        let built: ChatCompletionRequestMessage = match message.role {
            ChatRole::User => ChatCompletionRequestUserMessageArgs::default()
                .content(content)
                .build()
                .map_err(|e| PodragError::Chat(e.to_string()))?
                .into(),
            ChatRole::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
                .content(content)
                .build()
                .map_err(|e| PodragError::Chat(e.to_string()))?
                .into(),
        };
        Ok(built)
    }
}

#[async_trait]
impl ChatModel for OpenAIChat {
    #[instrument(skip(self, messages), fields(model = %self.model, messages = messages.len()))]
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let messages = messages
            .iter()
            .map(Self::to_request_message)
            .collect::<Result<Vec<_>>>()?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .build()
            .map_err(|e| PodragError::Chat(e.to_string()))?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            PodragError::OpenAI(format!("Failed to generate response: {}", e))
        })?;

        let answer = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .ok_or_else(|| PodragError::Chat("Empty response from LLM".to_string()))?
            .clone();

        debug!("Received {} characters from chat model", answer.len());
        Ok(answer)
    }
}
