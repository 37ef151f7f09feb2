// Chat model interface and related structure definitions
use anyhow::Error;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::models::message::{ChatMessage, TokenUsage};

// Simplified chat completion structure
#[derive(Clone, Debug)]
pub struct ChatCompletion {
    pub message: ChatMessage,
    pub usage: Option<TokenUsage>,
    pub model_name: String,
}

impl ChatCompletion {
    /// Raw text of the returned message
    pub fn text(&self) -> &str {
        self.message.content()
    }

    pub fn into_output(self) -> ModelOutput {
        ModelOutput::Text {
            text: self.message.content().to_string(),
        }
    }
}

/// Result of a model call after optional parsing.
///
/// A chain either stops at plain text or ends with a parser that produced
/// a structured value. Callers match on the variant instead of probing for
/// a `content` field.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelOutput {
    Text { text: String },
    Structured { value: Value },
}

impl ModelOutput {
    /// Content as a JSON value: text becomes a JSON string
    pub fn content(&self) -> Value {
        match self {
            ModelOutput::Text { text } => Value::String(text.clone()),
            ModelOutput::Structured { value } => value.clone(),
        }
    }

    pub fn is_structured(&self) -> bool {
        matches!(self, ModelOutput::Structured { .. })
    }
}

// Chat model interface
#[async_trait]
pub trait ChatModel: Send + Sync {
    // Basic model information
    fn model_name(&self) -> Option<&str> {
        None
    }

    // Provider label used in logs and the init endpoint
    fn provider(&self) -> &str;

    // Core method: handle chat messages
    async fn invoke(&self, messages: Vec<ChatMessage>) -> Result<ChatCompletion, Error>;

    /// Single-prompt convenience wrapper, sends the prompt as one human message
    async fn generate(&self, prompt: &str) -> Result<ChatCompletion, Error> {
        self.invoke(vec![ChatMessage::human(prompt)]).await
    }
}
