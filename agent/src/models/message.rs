// Message type definitions
use serde::{Deserialize, Serialize};

// Message content structure
#[derive(Clone, Debug, PartialEq)]
pub struct ChatMessageContent {
    pub content: String,
    pub name: Option<String>,
}

impl ChatMessageContent {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            name: None,
        }
    }
}

// Simplified message type system (aligned with langchain-core)
#[derive(Clone, Debug, PartialEq)]
pub enum ChatMessage {
    System(ChatMessageContent),
    Human(ChatMessageContent),
    AIMessage(ChatMessageContent),
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        ChatMessage::System(ChatMessageContent::new(content))
    }

    pub fn human(content: impl Into<String>) -> Self {
        ChatMessage::Human(ChatMessageContent::new(content))
    }

    pub fn ai(content: impl Into<String>) -> Self {
        ChatMessage::AIMessage(ChatMessageContent::new(content))
    }

    /// Role name as used by OpenAI-compatible APIs
    pub fn role(&self) -> &'static str {
        match self {
            ChatMessage::System(_) => "system",
            ChatMessage::Human(_) => "user",
            ChatMessage::AIMessage(_) => "assistant",
        }
    }

    pub fn content(&self) -> &str {
        match self {
            ChatMessage::System(c) | ChatMessage::Human(c) | ChatMessage::AIMessage(c) => &c.content,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            ChatMessage::System(c) | ChatMessage::Human(c) | ChatMessage::AIMessage(c) => c.name.as_deref(),
        }
    }
}

// Token usage statistics as reported by a provider
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    pub total_tokens: usize,
}
