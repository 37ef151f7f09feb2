// OpenAI-compatible chat model implementation
use super::chat::{ChatCompletion, ChatModel};
use super::message::{ChatMessage, ChatMessageContent, TokenUsage};
use anyhow::Error;
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Serialize, Deserialize, Clone)]
struct OpenAIMessage {
    role: String,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

// OpenAI traditional API usage statistics
#[derive(Deserialize, Default)]
struct OpenAIUsage {
    prompt_tokens: usize,
    completion_tokens: usize,
    total_tokens: usize,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    model: Option<String>,
    #[serde(default)]
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
}

// OpenAI model implementation - works with any OpenAI compatible endpoint
#[derive(Clone)]
pub struct OpenAIChatModel {
    client: Client,
    api_key: String,
    base_url: String,
    model_name: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    additional_headers: HashMap<String, String>,
    additional_params: HashMap<String, serde_json::Value>,
}

impl OpenAIChatModel {
    /// Create a new OpenAI chat model instance
    pub fn new(api_key: String, base_url: Option<String>) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: base_url.unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            model_name: None,
            temperature: Some(0.7),
            max_tokens: None,
            additional_headers: HashMap::new(),
            additional_params: HashMap::new(),
        }
    }

    /// Get base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get temperature parameter
    pub fn temperature(&self) -> Option<f32> {
        self.temperature
    }

    /// Get maximum number of tokens
    pub fn max_tokens(&self) -> Option<u32> {
        self.max_tokens
    }

    /// Set model name
    pub fn with_model(mut self, model_name: String) -> Self {
        self.model_name = Some(model_name);
        self
    }

    /// Set temperature parameter
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set maximum number of tokens
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Add additional request headers
    pub fn with_additional_header(mut self, key: String, value: String) -> Self {
        self.additional_headers.insert(key, value);
        self
    }

    /// Add additional request parameters
    pub fn with_additional_param(mut self, key: String, value: serde_json::Value) -> Self {
        self.additional_params.insert(key, value);
        self
    }

    fn request_body(&self, messages: Vec<ChatMessage>) -> serde_json::Value {
        let openai_messages: Vec<OpenAIMessage> = messages
            .iter()
            .map(|msg| OpenAIMessage {
                role: msg.role().to_string(),
                content: msg.content().to_string(),
                name: msg.name().map(str::to_string),
            })
            .collect();

        let mut request_body = serde_json::json!({
            "messages": openai_messages,
            "model": self.model_name.clone().unwrap_or_default(),
        });

        // Add optional parameters
        if let Some(temp) = self.temperature {
            request_body["temperature"] = serde_json::json!(temp);
        }
        if let Some(max) = self.max_tokens {
            request_body["max_tokens"] = serde_json::json!(max);
        }
        for (key, value) in &self.additional_params {
            request_body[key] = value.clone();
        }
        request_body
    }
}

#[async_trait]
impl ChatModel for OpenAIChatModel {
    fn model_name(&self) -> Option<&str> {
        self.model_name.as_deref()
    }

    fn provider(&self) -> &str {
        "openai"
    }

    async fn invoke(&self, messages: Vec<ChatMessage>) -> Result<ChatCompletion, Error> {
        let request_body = self.request_body(messages);
        let api_url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        debug!("POST {}", api_url);

        let mut request = self
            .client
            .post(&api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json");

        for (key, value) in &self.additional_headers {
            request = request.header(key, value);
        }

        let response = request.json(&request_body).send().await?;

        // Check response status
        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            return Err(Error::msg(format!("API request failed: {} - {}", status, error_text)));
        }

        let response: OpenAIResponse = response.json().await?;

        let choice = response
            .choices
            .first()
            .ok_or_else(|| Error::msg("No choices returned from API"))?;
        if choice.message.role != "assistant" {
            return Err(Error::msg(format!("Unexpected message role: {}", choice.message.role)));
        }

        let chat_message = ChatMessage::AIMessage(ChatMessageContent {
            content: choice.message.content.clone(),
            name: choice.message.name.clone(),
        });

        let usage = response.usage.as_ref().map(|openai_usage| TokenUsage {
            prompt_tokens: openai_usage.prompt_tokens,
            completion_tokens: openai_usage.completion_tokens,
            total_tokens: openai_usage.total_tokens,
        });

        let model_name = response
            .model
            .or_else(|| self.model_name.clone())
            .unwrap_or_else(|| "unknown".to_string());
        Ok(ChatCompletion {
            message: chat_message,
            usage,
            model_name,
        })
    }
}
