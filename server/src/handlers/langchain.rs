use axum::{
    extract::{rejection::JsonRejection, Query, State},
    response::Json,
};
use prompt_agent::samples::{
    comedian_prompt, joke_and_poem, joke_parser, ui_component_context, ui_component_sub_request, unify_responses,
    SIMPLE_ANSWER_PROMPT, UI_COMPONENT_LABEL,
};
use prompt_agent::{parse_or_passthrough, ChatModel, LeafOutcome, Runnable};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::info;
use utoipa::ToSchema;

use crate::config::AppState;
use crate::utils::{now_rfc3339, ApiEnvelope, AppError};

const DEFAULT_TOPIC: &str = "cat";

#[derive(Debug, Deserialize)]
pub struct SampleChatQuery {
    pub topic: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TopicRequest {
    pub topic: String,
}

// Configured provider and model
#[utoipa::path(
    get,
    path = "/langchain/init",
    tag = "langchain",
    summary = "Show the configured model",
    responses(
        (status = 200, description = "Provider and model name", body = ApiEnvelope)
    )
)]
pub async fn init(State(state): State<AppState>) -> Json<ApiEnvelope> {
    Json(ApiEnvelope::success(json!({
        "provider": state.provider,
        "model": state.model_name,
    })))
}

// One plain prompt, plain text answer
#[utoipa::path(
    get,
    path = "/langchain/simple_answer",
    tag = "langchain",
    summary = "Plain single prompt",
    responses(
        (status = 200, description = "Model answer", body = ApiEnvelope),
        (status = 500, description = "Model call failed", body = ApiEnvelope)
    )
)]
pub async fn simple_answer(State(state): State<AppState>) -> Result<Json<ApiEnvelope>, AppError> {
    let completion = state.model().generate(SIMPLE_ANSWER_PROMPT).await?;
    Ok(Json(ApiEnvelope::success(completion.into_output().content())))
}

// System + human chat prompt, parsed into {joke, followup}
#[utoipa::path(
    get,
    path = "/langchain/sample_chat",
    tag = "langchain",
    summary = "Joke as structured JSON",
    params(
        ("topic" = Option<String>, Query, description = "Joke topic, defaults to cat")
    ),
    responses(
        (status = 200, description = "Parsed joke, or the raw reply when it is not JSON", body = ApiEnvelope),
        (status = 500, description = "Model call failed", body = ApiEnvelope)
    )
)]
pub async fn sample_chat(
    State(state): State<AppState>,
    Query(query): Query<SampleChatQuery>,
) -> Result<Json<ApiEnvelope>, AppError> {
    let topic = query.topic.unwrap_or_else(|| DEFAULT_TOPIC.to_string());
    let messages = comedian_prompt()?.format_messages(&HashMap::from([("joke".to_string(), topic)]))?;

    let completion = state.model().invoke(messages).await?;
    let output = parse_or_passthrough(&joke_parser(), completion.text());
    Ok(Json(ApiEnvelope::success(output.content())))
}

// Joke and poem chains run concurrently, then merged
#[utoipa::path(
    post,
    path = "/langchain/runnables_parallel",
    tag = "langchain",
    summary = "Joke and poem in parallel",
    request_body = TopicRequest,
    responses(
        (status = 200, description = "Unified joke and poem", body = ApiEnvelope),
        (status = 500, description = "Malformed body or a failed branch", body = ApiEnvelope)
    )
)]
pub async fn runnables_parallel(
    State(state): State<AppState>,
    payload: Result<Json<TopicRequest>, JsonRejection>,
) -> Result<Json<ApiEnvelope>, AppError> {
    let Json(request) = payload?;

    let inputs = HashMap::from([("topic".to_string(), request.topic.clone())]);
    let results = joke_and_poem(state.model().clone()).invoke(inputs).await?;
    let unified = unify_responses(&request.topic, results, &now_rfc3339())?;
    info!("runnables_parallel merged responses for topic '{}'", request.topic);
    Ok(Json(ApiEnvelope::success(unified)))
}

// JSX generation from a component architecture
#[utoipa::path(
    post,
    path = "/langchain/ui_component",
    tag = "langchain",
    summary = "Generate JSX from an architecture",
    description = "The body is the architecture, usually JSON; any other text is passed on as a plain string.",
    request_body = String,
    responses(
        (status = 200, description = "{jsx_code, component_name, imports}, or the raw reply", body = ApiEnvelope),
        (status = 500, description = "Model call failed", body = ApiEnvelope)
    )
)]
pub async fn ui_component(State(state): State<AppState>, body: String) -> Result<Json<ApiEnvelope>, AppError> {
    let architecture = serde_json::from_str::<Value>(&body).unwrap_or(Value::String(body));

    let mut aggregate = state
        .orchestrator
        .run_single(&ui_component_context(&architecture), ui_component_sub_request()?)
        .await?;
    match aggregate.results.remove(UI_COMPONENT_LABEL) {
        Some(LeafOutcome::Failed { error }) => Err(AppError::Upstream(error)),
        Some(outcome) => Ok(Json(ApiEnvelope::success(json!(outcome)))),
        None => Err(AppError::Orchestration(format!("no '{}' leaf in batch", UI_COMPONENT_LABEL))),
    }
}
