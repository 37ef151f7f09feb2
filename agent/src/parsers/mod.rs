// Output parsers: turn raw model text into structured values
mod json;

use log::warn;
use serde_json::Value;
use thiserror::Error;

use crate::models::ModelOutput;

pub use json::{JsonExpectation, JsonOutputParser};

#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("no JSON value found in model output")]
    NoJsonFound,
    #[error("invalid JSON: {0}")]
    InvalidJson(String),
    #[error("JSON does not match the expected schema: {0}")]
    SchemaMismatch(String),
}

// Output parser interface (aligned with langchain-core)
pub trait OutputParser: Send + Sync {
    fn parse(&self, text: &str) -> Result<Value, ParseError>;

    // Instructions that can be bound into a prompt as a partial variable
    fn format_instructions(&self) -> Option<String> {
        None
    }
}

/// Parse `text`, keeping the raw text when parsing fails
pub fn parse_or_passthrough(parser: &dyn OutputParser, text: &str) -> ModelOutput {
    match parser.parse(text) {
        Ok(value) => ModelOutput::Structured { value },
        Err(e) => {
            warn!("Model output left unparsed: {}", e);
            ModelOutput::Text { text: text.to_string() }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passthrough_keeps_raw_text() {
        let parser = JsonOutputParser::new();
        let output = parse_or_passthrough(&parser, "Sorry, I cannot answer that.");
        assert_eq!(
            output,
            ModelOutput::Text {
                text: "Sorry, I cannot answer that.".to_string()
            }
        );
    }

    #[test]
    fn test_passthrough_structured_on_success() {
        let parser = JsonOutputParser::new();
        let output = parse_or_passthrough(&parser, "[1, 2, 3]");
        assert!(output.is_structured());
        assert_eq!(output.content(), serde_json::json!([1, 2, 3]));
    }
}
