// Prompt Agent: prompt templates, chat models and fan-out orchestration aligned with LangChain-Core

mod core;
pub mod models;
pub mod prompt;
pub mod parsers;
pub mod usage;
pub mod orchestrator;
pub mod fortune;
pub mod samples;

// Re-export main components for external use
pub use self::core::{pipe, BranchResults, ModelRunnable, OutputRunnable, PromptRunnable, Runnable, RunnableFuture, RunnableParallel};
pub use models::{
    AnthropicChatModel, ChatCompletion, ChatMessage, ChatMessageContent, ChatModel, ModelOutput, OpenAIChatModel,
    StubChatModel, TokenUsage,
};
pub use prompt::{ChatPromptTemplate, MessageRole, PromptError, PromptTemplate};
pub use parsers::{parse_or_passthrough, JsonExpectation, JsonOutputParser, OutputParser, ParseError};
pub use usage::{LeafUsage, ModelPrice, PriceTable, UsageReport};
pub use orchestrator::{AggregatedResult, LeafOutcome, Orchestrator, OrchestratorError, SubRequest};

// Export anyhow error handling library to ensure consistent error handling for third-party users
pub use anyhow;
