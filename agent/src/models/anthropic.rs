// Anthropic Messages API chat model
use super::chat::{ChatCompletion, ChatModel};
use super::message::{ChatMessage, TokenUsage};
use anyhow::Error;
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 4096;

#[derive(Serialize)]
struct AnthropicMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct AnthropicContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct AnthropicUsage {
    input_tokens: usize,
    output_tokens: usize,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    model: Option<String>,
    #[serde(default)]
    content: Vec<AnthropicContentBlock>,
    usage: Option<AnthropicUsage>,
}

/// Chat model backed by `POST {base_url}/v1/messages`.
///
/// System messages are concatenated into the top-level `system` field, the
/// remaining messages keep their order.
#[derive(Clone)]
pub struct AnthropicChatModel {
    client: Client,
    api_key: String,
    base_url: String,
    model_name: String,
    temperature: Option<f32>,
    max_tokens: u32,
}

impl AnthropicChatModel {
    pub fn new(api_key: String, base_url: Option<String>) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: base_url.unwrap_or_else(|| "https://api.anthropic.com".to_string()),
            model_name: "claude-3-opus-20240229".to_string(),
            temperature: None,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn with_model(mut self, model_name: String) -> Self {
        self.model_name = model_name;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    fn request_body(&self, messages: Vec<ChatMessage>) -> serde_json::Value {
        let mut system_parts = Vec::new();
        let mut conversation = Vec::new();
        for message in messages {
            match message {
                ChatMessage::System(content) => system_parts.push(content.content),
                ChatMessage::Human(content) => conversation.push(AnthropicMessage {
                    role: "user",
                    content: content.content,
                }),
                ChatMessage::AIMessage(content) => conversation.push(AnthropicMessage {
                    role: "assistant",
                    content: content.content,
                }),
            }
        }

        let mut body = serde_json::json!({
            "model": self.model_name,
            "max_tokens": self.max_tokens,
            "messages": conversation,
        });
        if !system_parts.is_empty() {
            body["system"] = serde_json::json!(system_parts.join("\n\n"));
        }
        if let Some(temp) = self.temperature {
            body["temperature"] = serde_json::json!(temp);
        }
        body
    }
}

#[async_trait]
impl ChatModel for AnthropicChatModel {
    fn model_name(&self) -> Option<&str> {
        Some(&self.model_name)
    }

    fn provider(&self) -> &str {
        "anthropic"
    }

    async fn invoke(&self, messages: Vec<ChatMessage>) -> Result<ChatCompletion, Error> {
        let body = self.request_body(messages);
        let api_url = format!("{}/v1/messages", self.base_url.trim_end_matches('/'));
        debug!("POST {}", api_url);

        let response = self
            .client
            .post(&api_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            return Err(Error::msg(format!("API request failed: {} - {}", status, error_text)));
        }

        let response: AnthropicResponse = response.json().await?;
        let text: String = response
            .content
            .iter()
            .filter(|block| block.kind == "text")
            .map(|block| block.text.as_str())
            .collect::<Vec<_>>()
            .join("");
        if text.is_empty() {
            return Err(Error::msg("No text content returned from API"));
        }

        let usage = response.usage.map(|u| TokenUsage {
            prompt_tokens: u.input_tokens,
            completion_tokens: u.output_tokens,
            total_tokens: u.input_tokens + u.output_tokens,
        });

        Ok(ChatCompletion {
            message: ChatMessage::ai(text),
            usage,
            model_name: response.model.unwrap_or_else(|| self.model_name.clone()),
        })
    }
}
