// Prompt module definition
mod chat;
mod template;

pub use chat::{ChatPromptTemplate, MessageRole};
pub use template::{stringify_context, PromptError, PromptTemplate};
