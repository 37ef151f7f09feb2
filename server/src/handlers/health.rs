use axum::response::Json;
use serde_json::json;

use crate::utils::ApiEnvelope;

// Liveness probe
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    summary = "Liveness probe",
    responses(
        (status = 200, description = "Server is up", body = ApiEnvelope)
    )
)]
pub async fn health() -> Json<ApiEnvelope> {
    Json(ApiEnvelope::success(json!("ok")))
}
