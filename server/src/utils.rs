use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use prompt_agent::{OrchestratorError, PromptError};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::error;
use utoipa::ToSchema;

pub const STATUS_SUCCESS: &str = "Success";
pub const STATUS_ERROR: &str = "Error";

/// `{status, message}` wrapper shared by every endpoint
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiEnvelope {
    pub status: String,
    #[schema(value_type = Object)]
    pub message: Value,
}

impl ApiEnvelope {
    pub fn success(message: Value) -> Self {
        Self {
            status: STATUS_SUCCESS.to_string(),
            message,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: STATUS_ERROR.to_string(),
            message: Value::String(message.into()),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    MalformedBody(String),
    #[error("{0}")]
    Upstream(String),
    #[error("{0}")]
    Orchestration(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // every failure surfaces as 500 with the error envelope
        error!("request failed: {:?}", self);
        (StatusCode::INTERNAL_SERVER_ERROR, Json(ApiEnvelope::error(self.to_string()))).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::MalformedBody(rejection.body_text())
    }
}

impl From<OrchestratorError> for AppError {
    fn from(err: OrchestratorError) -> Self {
        AppError::Orchestration(err.to_string())
    }
}

impl From<PromptError> for AppError {
    fn from(err: PromptError) -> Self {
        AppError::Orchestration(err.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Upstream(err.to_string())
    }
}

/// Current local time as RFC 3339
pub fn now_rfc3339() -> String {
    chrono::Local::now().to_rfc3339()
}
