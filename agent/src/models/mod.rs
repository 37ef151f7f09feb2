// Model module definition
mod anthropic;
mod chat;
mod message;
mod openai;
pub mod stub;

// Re-export module content
pub use anthropic::AnthropicChatModel;
pub use chat::{ChatCompletion, ChatModel, ModelOutput};
pub use message::{ChatMessage, ChatMessageContent, TokenUsage};
pub use openai::OpenAIChatModel;
pub use stub::StubChatModel;
