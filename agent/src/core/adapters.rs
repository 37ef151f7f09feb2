// Runnable adapters for templates, chat models and parsers, so that
// `prompt -> model -> parser` can be composed with `pipe`
use std::collections::HashMap;
use std::sync::Arc;

use super::runnable::{Runnable, RunnableFuture};
use crate::models::{ChatCompletion, ChatModel, ModelOutput};
use crate::parsers::{parse_or_passthrough, OutputParser};
use crate::prompt::PromptTemplate;

#[derive(Clone)]
pub struct PromptRunnable {
    template: PromptTemplate,
}

impl PromptRunnable {
    pub fn new(template: PromptTemplate) -> Self {
        Self { template }
    }
}

impl Runnable<HashMap<String, String>, String> for PromptRunnable {
    fn invoke(&self, input: HashMap<String, String>) -> RunnableFuture<String> {
        let rendered = self.template.format(&input).map_err(anyhow::Error::from);
        Box::pin(async move { rendered })
    }

    fn clone_to_owned(&self) -> Box<dyn Runnable<HashMap<String, String>, String> + Send + Sync> {
        Box::new(self.clone())
    }
}

#[derive(Clone)]
pub struct ModelRunnable {
    model: Arc<dyn ChatModel>,
}

impl ModelRunnable {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }
}

impl Runnable<String, ChatCompletion> for ModelRunnable {
    fn invoke(&self, prompt: String) -> RunnableFuture<ChatCompletion> {
        let model = Arc::clone(&self.model);
        Box::pin(async move { model.generate(&prompt).await })
    }

    fn clone_to_owned(&self) -> Box<dyn Runnable<String, ChatCompletion> + Send + Sync> {
        Box::new(self.clone())
    }
}

/// Final chain step turning a completion into a [`ModelOutput`]
#[derive(Clone)]
pub struct OutputRunnable {
    parser: Option<Arc<dyn OutputParser>>,
}

impl OutputRunnable {
    /// Keep the completion as plain text
    pub fn text() -> Self {
        Self { parser: None }
    }

    /// Parse the completion, falling back to plain text on failure
    pub fn parsed(parser: Arc<dyn OutputParser>) -> Self {
        Self { parser: Some(parser) }
    }
}

impl Runnable<ChatCompletion, ModelOutput> for OutputRunnable {
    fn invoke(&self, completion: ChatCompletion) -> RunnableFuture<ModelOutput> {
        let output = match &self.parser {
            Some(parser) => parse_or_passthrough(parser.as_ref(), completion.text()),
            None => completion.into_output(),
        };
        Box::pin(async move { Ok(output) })
    }

    fn clone_to_owned(&self) -> Box<dyn Runnable<ChatCompletion, ModelOutput> + Send + Sync> {
        Box::new(self.clone())
    }
}
