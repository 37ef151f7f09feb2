// Scripted chat model for tests and offline runs
use super::chat::{ChatCompletion, ChatModel};
use super::message::{ChatMessage, TokenUsage};
use anyhow::Error;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone, Debug)]
enum StubReply {
    Text(String),
    Fail(String),
}

/// A chat model that answers from a fixed script.
///
/// Rules are matched in insertion order against the concatenated prompt
/// text; the first rule whose marker is contained in the prompt wins.
/// Unmatched prompts get the fallback reply.
#[derive(Clone)]
pub struct StubChatModel {
    model_name: String,
    rules: Vec<(String, StubReply)>,
    fallback: String,
    usage: Option<TokenUsage>,
    delay: Option<Duration>,
    calls: Arc<AtomicUsize>,
}

impl StubChatModel {
    pub fn new(fallback: impl Into<String>) -> Self {
        Self {
            model_name: "stub-model".to_string(),
            rules: Vec::new(),
            fallback: fallback.into(),
            usage: None,
            delay: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_model_name(mut self, model_name: impl Into<String>) -> Self {
        self.model_name = model_name.into();
        self
    }

    /// Reply with `reply` when the prompt contains `marker`
    pub fn reply_when(mut self, marker: impl Into<String>, reply: impl Into<String>) -> Self {
        self.rules.push((marker.into(), StubReply::Text(reply.into())));
        self
    }

    /// Fail with `error` when the prompt contains `marker`
    pub fn fail_when(mut self, marker: impl Into<String>, error: impl Into<String>) -> Self {
        self.rules.push((marker.into(), StubReply::Fail(error.into())));
        self
    }

    /// Report fixed provider usage on every completion
    pub fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.usage = Some(usage);
        self
    }

    /// Sleep before answering, used to observe concurrency
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of completed or failed invocations so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn reply_for(&self, prompt: &str) -> StubReply {
        self.rules
            .iter()
            .find(|(marker, _)| prompt.contains(marker.as_str()))
            .map(|(_, reply)| reply.clone())
            .unwrap_or_else(|| StubReply::Text(self.fallback.clone()))
    }
}

#[async_trait]
impl ChatModel for StubChatModel {
    fn model_name(&self) -> Option<&str> {
        Some(&self.model_name)
    }

    fn provider(&self) -> &str {
        "stub"
    }

    async fn invoke(&self, messages: Vec<ChatMessage>) -> Result<ChatCompletion, Error> {
        let prompt = messages.iter().map(ChatMessage::content).collect::<Vec<_>>().join("\n");
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.calls.fetch_add(1, Ordering::SeqCst);

        match self.reply_for(&prompt) {
            StubReply::Text(text) => Ok(ChatCompletion {
                message: ChatMessage::ai(text),
                usage: self.usage.clone(),
                model_name: self.model_name.clone(),
            }),
            StubReply::Fail(error) => Err(Error::msg(error)),
        }
    }
}
