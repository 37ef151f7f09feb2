//! Small single-purpose prompt recipes: a plain answer, a JSON joke chat,
//! a joke/poem pair run in parallel, and JSX generation from a component
//! architecture.
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

use crate::core::{pipe, BranchResults, ModelRunnable, OutputRunnable, PromptRunnable, RunnableParallel};
use crate::models::{ChatModel, ModelOutput};
use crate::orchestrator::SubRequest;
use crate::parsers::JsonOutputParser;
use crate::prompt::{ChatPromptTemplate, MessageRole, PromptError, PromptTemplate};

pub const SIMPLE_ANSWER_PROMPT: &str = "You are kind AI. If the user ask you, you will answer.";
pub const UI_COMPONENT_LABEL: &str = "ui_component";

const JOKE_FORMAT: &str = r#"You must respond with a JSON object in the following format:
{"joke": "The joke content here", "followup": "A funny follow-up comment here"}"#;

const COMEDIAN_SYSTEM: &str = "I'm a professional comedian.

Instructions:
1. Always make jokes that are family-friendly and appropriate for all ages
2. Use wordplay and puns whenever possible
3. End each joke with a funny follow-up comment
4. Keep the jokes short and to the point
5. Respond in Korean language

{format_instructions}";

const JSX_FORMAT: &str = r#"{"jsx_code": "the JSX code as a string", "component_name": "ComponentName", "imports": ["required import statements"]}"#;

const JSX_EXAMPLE: &str = r#"jsx_code: "const ComponentName = () => {\n  const [inputValue, setInputValue] = useState('');\n\n  return (\n    <div id={target_id} style={{display: 'flex'}}>\n      <label>label</label>\n      <input value={inputValue} onChange={(e) => setInputValue(e.target.value)} />\n      <button disabled={!inputValue}>submit</button>\n    </div>\n  );\n};",
component_name: "ComponentName",
imports: ["import React, { useState } from 'react';"]"#;

const UI_COMPONENT_TEMPLATE: &str = "You are an expert web developer. Create JSX code based on the given architecture.

Example: {example}

Architecture: {architecture}

The root element must use id=\"{target_id}\".

1. Return Only JSON
2. Return a JSON response with the following structure:
{format_instructions}";

/// System + human chat prompt producing `{joke, followup}`
pub fn comedian_prompt() -> Result<ChatPromptTemplate, PromptError> {
    ChatPromptTemplate::new(
        vec![
            (MessageRole::System, COMEDIAN_SYSTEM.to_string()),
            (MessageRole::Human, "Tell me a joke about {joke}".to_string()),
        ],
        vec!["joke".to_string()],
        HashMap::from([("format_instructions".to_string(), JOKE_FORMAT.to_string())]),
    )
}

pub fn joke_parser() -> JsonOutputParser {
    JsonOutputParser::new().expect_keys(&["joke", "followup"])
}

/// Joke and two-line poem about `{topic}`, as concurrent plain-text chains
pub fn joke_and_poem(model: Arc<dyn ChatModel>) -> RunnableParallel<HashMap<String, String>, ModelOutput> {
    let chain = |template: &str| {
        pipe(
            pipe(
                PromptRunnable::new(PromptTemplate::from_template(template)),
                ModelRunnable::new(Arc::clone(&model)),
            ),
            OutputRunnable::text(),
        )
    };
    RunnableParallel::new()
        .branch("joke", chain("tell me a joke about {topic}"))
        .branch("poem", chain("write a 2-line poem about {topic}"))
}

/// Merge the joke/poem branch results into one payload.
///
/// Fails with the first branch error, in branch name order.
pub fn unify_responses(
    topic: &str,
    results: BranchResults<ModelOutput>,
    timestamp: &str,
) -> Result<Value, anyhow::Error> {
    let mut responses = Vec::with_capacity(results.len());
    for (kind, result) in results {
        let output = result?;
        responses.push(json!({"type": kind, "content": output.content()}));
    }
    Ok(json!({
        "unified_result": {
            "topic": topic,
            "responses": responses,
            "timestamp": timestamp,
        }
    }))
}

/// Single leaf turning a component architecture into JSX.
///
/// Inputs: `architecture` and `target_id`.
pub fn ui_component_sub_request() -> Result<SubRequest, PromptError> {
    let template = PromptTemplate::new(
        UI_COMPONENT_TEMPLATE,
        vec!["architecture".to_string(), "target_id".to_string()],
        HashMap::from([
            ("example".to_string(), JSX_EXAMPLE.to_string()),
            ("format_instructions".to_string(), JSX_FORMAT.to_string()),
        ]),
    )?;
    Ok(SubRequest::new(
        UI_COMPONENT_LABEL,
        template,
        JsonOutputParser::new().expect_keys(&["jsx_code", "component_name", "imports"]),
    ))
}

/// Context for [`ui_component_sub_request`]; the target id comes from the
/// architecture's `id` field, or `default_id`
pub fn ui_component_context(architecture: &Value) -> Map<String, Value> {
    let target_id = match architecture.get("id") {
        Some(Value::String(id)) => id.clone(),
        Some(id) if !id.is_null() => id.to_string(),
        _ => "default_id".to_string(),
    };
    let mut context = Map::new();
    context.insert("architecture".to_string(), architecture.clone());
    context.insert("target_id".to_string(), Value::String(target_id));
    context
}
