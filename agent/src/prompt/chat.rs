// Chat prompt template: an ordered list of role-tagged templates
use std::collections::HashMap;

use super::template::{PromptError, PromptTemplate};
use crate::models::ChatMessage;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageRole {
    System,
    Human,
    Ai,
}

#[derive(Clone, Debug)]
pub struct ChatPromptTemplate {
    messages: Vec<(MessageRole, PromptTemplate)>,
}

impl ChatPromptTemplate {
    /// Every message shares the same input and partial variables
    pub fn new(
        messages: Vec<(MessageRole, String)>,
        input_variables: Vec<String>,
        partial_variables: HashMap<String, String>,
    ) -> Result<Self, PromptError> {
        let messages = messages
            .into_iter()
            .map(|(role, text)| {
                PromptTemplate::new(text, input_variables.clone(), partial_variables.clone()).map(|t| (role, t))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { messages })
    }

    pub fn format_messages(&self, inputs: &HashMap<String, String>) -> Result<Vec<ChatMessage>, PromptError> {
        self.messages
            .iter()
            .map(|(role, template)| {
                let text = template.format(inputs)?;
                Ok(match role {
                    MessageRole::System => ChatMessage::system(text),
                    MessageRole::Human => ChatMessage::human(text),
                    MessageRole::Ai => ChatMessage::ai(text),
                })
            })
            .collect()
    }
}
