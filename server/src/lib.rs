use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod config;
pub mod handlers;
pub mod openapi;
pub mod utils;

#[cfg(test)]
mod config_tests;

use crate::config::AppState;
use crate::handlers::{fortune, health, langchain};

pub fn create_router(state: AppState) -> Router {
    Router::new()
        // fortune telling
        .route("/fortune/parallel", post(fortune::fortune_parallel))
        .route("/fortune/combined", post(fortune::fortune_combined))
        // sample chains
        .route("/langchain/init", get(langchain::init))
        .route("/langchain/simple_answer", get(langchain::simple_answer))
        .route("/langchain/sample_chat", get(langchain::sample_chat))
        .route("/langchain/runnables_parallel", post(langchain::runnables_parallel))
        .route("/langchain/ui_component", post(langchain::ui_component))
        .route("/health", get(health::health))
        .route("/api-docs/openapi.json", get(openapi::openapi_json))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
