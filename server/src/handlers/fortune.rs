use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
};
use prompt_agent::fortune::{combined_sub_request, fortune_context, fortune_sub_requests, FortuneTelling};
use prompt_agent::AggregatedResult;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::config::AppState;
use crate::utils::{ApiEnvelope, AppError};

// Fortune request
#[derive(Debug, Deserialize, ToSchema)]
pub struct FortuneRequest {
    /// Free-form description of the person, e.g. birth date, time and gender
    pub user_info: String,
}

fn log_batch(endpoint: &str, aggregate: &AggregatedResult) {
    let failed = aggregate.failed_labels();
    if failed.is_empty() {
        info!(
            "{} batch {} finished in {:.3}s",
            endpoint, aggregate.batch_id, aggregate.execution_time
        );
    } else {
        warn!(
            "{} batch {} finished in {:.3}s with failed leaves: {}",
            endpoint,
            aggregate.batch_id,
            aggregate.execution_time,
            failed.join(", ")
        );
    }
}

fn respond(telling: FortuneTelling) -> Json<ApiEnvelope> {
    Json(ApiEnvelope::success(json!({ "fortune_telling": telling })))
}

// Four period fortunes, one model call each, run concurrently
#[utoipa::path(
    post,
    path = "/fortune/parallel",
    tag = "fortune",
    summary = "Fortune for every period, in parallel",
    description = "Fans out one prompt per period (daily, weekly, monthly, yearly) and merges the replies. A failed period carries an error marker; the response stays 200.",
    request_body = FortuneRequest,
    responses(
        (status = 200, description = "Fortune telling", body = ApiEnvelope),
        (status = 500, description = "Malformed request body", body = ApiEnvelope)
    )
)]
pub async fn fortune_parallel(
    State(state): State<AppState>,
    payload: Result<Json<FortuneRequest>, JsonRejection>,
) -> Result<Json<ApiEnvelope>, AppError> {
    let Json(request) = payload?;

    let aggregate = state
        .orchestrator
        .fan_out(&fortune_context(&request.user_info), fortune_sub_requests()?)
        .await?;
    log_batch("parallel", &aggregate);

    Ok(respond(FortuneTelling::from_parallel(request.user_info, aggregate)))
}

// All four periods from a single model call
#[utoipa::path(
    post,
    path = "/fortune/combined",
    tag = "fortune",
    summary = "Fortune for every period, one prompt",
    description = "Asks for all periods in a single prompt and splits the reply per period.",
    request_body = FortuneRequest,
    responses(
        (status = 200, description = "Fortune telling", body = ApiEnvelope),
        (status = 500, description = "Malformed request body", body = ApiEnvelope)
    )
)]
pub async fn fortune_combined(
    State(state): State<AppState>,
    payload: Result<Json<FortuneRequest>, JsonRejection>,
) -> Result<Json<ApiEnvelope>, AppError> {
    let Json(request) = payload?;

    let aggregate = state
        .orchestrator
        .run_single(&fortune_context(&request.user_info), combined_sub_request()?)
        .await?;
    log_batch("combined", &aggregate);

    Ok(respond(FortuneTelling::from_combined(request.user_info, aggregate)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils_tests::{create_test_app_state, create_test_server, five_items};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use pretty_assertions::assert_eq;
    use prompt_agent::fortune::{Period, ITEMS_PER_PERIOD};
    use prompt_agent::StubChatModel;
    use serde_json::Value;
    use tower::ServiceExt;

    const USER_INFO: &str = "1990-05-15 08:30, female";

    fn stub_for_periods() -> StubChatModel {
        Period::ALL.iter().fold(StubChatModel::new("no fortune"), |model, period| {
            model.reply_when(format!("the {} fortune", period.label()), five_items())
        })
    }

    #[tokio::test]
    async fn test_fortune_parallel_success() {
        let server = create_test_server(create_test_app_state(stub_for_periods()));

        let response = server
            .post("/fortune/parallel")
            .json(&json!({ "user_info": USER_INFO }))
            .await;
        response.assert_status_ok();

        let body: Value = response.json();
        assert_eq!(body["status"], "Success");
        let telling = &body["message"]["fortune_telling"];
        assert_eq!(telling["user_info"], USER_INFO);
        for period in Period::ALL {
            assert_eq!(
                telling["results"][period.label()].as_array().map(Vec::len),
                Some(ITEMS_PER_PERIOD),
                "{}",
                period.label()
            );
        }

        let usage = &telling["token_usage"];
        let leaf_sum: u64 = usage["leaves"]
            .as_object()
            .unwrap()
            .values()
            .map(|leaf| leaf["total_tokens"].as_u64().unwrap())
            .sum();
        assert_eq!(usage["total"]["total_tokens"].as_u64(), Some(leaf_sum));
        assert_eq!(usage["total"]["estimated"], true);
        assert!(telling["execution_time"].as_f64().is_some());
        assert!(telling["timestamp"].as_str().is_some());
    }

    #[tokio::test]
    async fn test_fortune_parallel_failed_period_keeps_200() {
        let model = StubChatModel::new("no fortune")
            .fail_when("the weekly fortune", "upstream timed out")
            .reply_when("fortune", five_items());
        let server = create_test_server(create_test_app_state(model));

        let response = server
            .post("/fortune/parallel")
            .json(&json!({ "user_info": USER_INFO }))
            .await;
        response.assert_status_ok();

        let body: Value = response.json();
        assert_eq!(body["status"], "Success");
        let results = body["message"]["fortune_telling"]["results"].as_object().unwrap();
        assert_eq!(results.len(), 4);
        assert_eq!(results["weekly"], json!({ "error": "upstream timed out", "failed": true }));
        assert_eq!(results["daily"].as_array().map(Vec::len), Some(ITEMS_PER_PERIOD));
    }

    #[tokio::test]
    async fn test_fortune_combined_success() {
        let combined: Value = Period::ALL
            .iter()
            .map(|p| (p.label().to_string(), serde_json::from_str::<Value>(&five_items()).unwrap()))
            .collect::<serde_json::Map<String, Value>>()
            .into();
        let model = StubChatModel::new(format!("Here you go:\n```json\n{}\n```", combined));
        let server = create_test_server(create_test_app_state(model));

        let response = server
            .post("/fortune/combined")
            .json(&json!({ "user_info": USER_INFO }))
            .await;
        response.assert_status_ok();

        let body: Value = response.json();
        let telling = &body["message"]["fortune_telling"];
        assert_eq!(telling["results"]["monthly"], combined["monthly"]);
        assert_eq!(
            telling["token_usage"]["leaves"].as_object().unwrap().keys().collect::<Vec<_>>(),
            vec!["combined"]
        );
    }

    #[tokio::test]
    async fn test_fortune_malformed_body_is_500() {
        let app = crate::create_router(create_test_app_state(stub_for_periods()));

        let request = Request::builder()
            .method("POST")
            .uri("/fortune/parallel")
            .header("content-type", "application/json")
            .body(Body::from("{\"user_info\": "))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "Error");
        assert!(body["message"].as_str().is_some_and(|m| !m.is_empty()));
    }

    #[tokio::test]
    async fn test_fortune_missing_field_is_500() {
        let server = create_test_server(create_test_app_state(stub_for_periods()));

        let response = server.post("/fortune/combined").json(&json!({ "name": "x" })).await;
        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = response.json();
        assert_eq!(body["status"], "Error");
    }
}
