//! Wire types for the text-generation APIs

use serde::{Deserialize, Serialize};

/// Message in a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    /// Create a user message
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: text.into(),
        }
    }

    /// Create a system message (OpenAI-style APIs only)
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: text.into(),
        }
    }
}

/// Provider-neutral completion request.
///
/// Serializes as an Anthropic Messages API body; OpenAI-compatible
/// providers go through [`ChatCompletionRequest::from_messages_request`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagesRequest {
    pub model: String,
    pub max_tokens: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    pub messages: Vec<Message>,
}

/// Anthropic Messages API response
#[derive(Debug, Clone, Deserialize)]
pub struct MessagesResponse {
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub stop_reason: Option<String>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

impl MessagesResponse {
    /// Concatenated text blocks
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                ContentBlock::Other => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Content block in an Anthropic response
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

/// Token usage information
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

// ============================================================================
// OpenAI-compatible types
// ============================================================================

/// OpenAI-compatible chat completion request
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u64>,
}

impl ChatCompletionRequest {
    /// Convert from the provider-neutral request; the system prompt becomes
    /// the leading `system` message.
    pub fn from_messages_request(req: &MessagesRequest) -> Self {
        let mut messages = Vec::with_capacity(req.messages.len() + 1);

        if let Some(system) = &req.system {
            messages.push(Message::system(system));
        }
        messages.extend(req.messages.iter().cloned());

        Self {
            model: req.model.clone(),
            messages,
            max_tokens: Some(req.max_tokens),
        }
    }
}

/// OpenAI-compatible chat completion response
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse {
    pub choices: Vec<ChatChoice>,
    #[serde(default)]
    pub usage: Option<OpenAiUsage>,
}

impl ChatCompletionResponse {
    /// Text of the first choice, if any
    pub fn text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.message.content.as_deref())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    pub message: ChatMessageResponse,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatMessageResponse {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct OpenAiUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

/// Builder for creating completion requests
pub struct MessagesRequestBuilder {
    model: String,
    max_tokens: u64,
    system: Option<String>,
    messages: Vec<Message>,
}

impl MessagesRequestBuilder {
    pub fn new(model: String) -> Self {
        Self {
            model,
            max_tokens: 1024,
            system: None,
            messages: vec![],
        }
    }

    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn max_tokens(mut self, max_tokens: u64) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn user(mut self, text: impl Into<String>) -> Self {
        self.messages.push(Message::user(text));
        self
    }

    pub fn build(self) -> MessagesRequest {
        MessagesRequest {
            model: self.model,
            max_tokens: self.max_tokens,
            system: self.system,
            messages: self.messages,
        }
    }
}
