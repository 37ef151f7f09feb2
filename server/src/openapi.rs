use axum::response::Json;
use utoipa::OpenApi;

use crate::handlers::{fortune, health, langchain};
use crate::utils::ApiEnvelope;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Fortune API",
        version = "0.1.0",
        description = "Prompt orchestration backend: parallel fortune telling and sample prompt chains"
    ),
    paths(
        fortune::fortune_parallel,
        fortune::fortune_combined,
        langchain::init,
        langchain::simple_answer,
        langchain::sample_chat,
        langchain::runnables_parallel,
        langchain::ui_component,
        health::health
    ),
    components(
        schemas(ApiEnvelope, fortune::FortuneRequest, langchain::TopicRequest)
    ),
    tags(
        (name = "fortune", description = "Fortune telling over every period"),
        (name = "langchain", description = "Sample prompt chains"),
        (name = "health", description = "Liveness")
    )
)]
pub struct ApiDoc;

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
