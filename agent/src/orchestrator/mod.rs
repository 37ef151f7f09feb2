//! Fan-out / fan-in prompt orchestration.
//!
//! One batch renders every sub-request against a shared read-only context,
//! calls the model for all of them concurrently and waits for every leaf
//! before aggregating. A leaf that fails to render or whose model call fails
//! is reported with an error marker; its siblings are unaffected. A leaf
//! whose reply is not valid JSON keeps the raw text.
mod outcome;
mod sub_request;

use log::{debug, info, warn};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tokio::time::Instant;
use thiserror::Error;
use uuid::Uuid;

use crate::core::{Runnable, RunnableFuture, RunnableParallel};
use crate::models::ChatModel;
use crate::parsers::parse_or_passthrough;
use crate::prompt::stringify_context;
use crate::usage::{LeafUsage, PriceTable, UsageReport};

pub use outcome::{AggregatedResult, LeafOutcome};
pub use sub_request::SubRequest;

type Context = Arc<HashMap<String, String>>;

#[derive(Debug, Error, PartialEq)]
pub enum OrchestratorError {
    #[error("a fan-out needs at least one sub-request")]
    EmptyBatch,
    #[error("duplicate sub-request label '{0}'")]
    DuplicateLabel(String),
    #[error("fan-out dispatch failed: {0}")]
    Dispatch(String),
}

struct LeafReport {
    outcome: LeafOutcome,
    usage: LeafUsage,
}

// render -> model call -> parse, for a single sub-request
#[derive(Clone)]
struct LeafRunnable {
    sub_request: SubRequest,
    model: Arc<dyn ChatModel>,
    prices: Arc<PriceTable>,
}

impl Runnable<Context, LeafReport> for LeafRunnable {
    fn invoke(&self, context: Context) -> RunnableFuture<LeafReport> {
        let leaf = self.clone();
        Box::pin(async move {
            let prompt = leaf.sub_request.template.format(&context)?;
            debug!("leaf '{}' prompt is {} chars", leaf.sub_request.label, prompt.chars().count());

            let completion = leaf.model.generate(&prompt).await?;
            let usage = LeafUsage::from_response(
                completion.text(),
                completion.usage.as_ref(),
                &completion.model_name,
                &leaf.prices,
            );
            let outcome = parse_or_passthrough(leaf.sub_request.parser.as_ref(), completion.text()).into();
            Ok::<_, anyhow::Error>(LeafReport { outcome, usage })
        })
    }

    fn clone_to_owned(&self) -> Box<dyn Runnable<Context, LeafReport> + Send + Sync> {
        Box::new(self.clone())
    }
}

/// Runs fan-out batches against one injected chat model
#[derive(Clone)]
pub struct Orchestrator {
    model: Arc<dyn ChatModel>,
    prices: Arc<PriceTable>,
}

impl Orchestrator {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self {
            model,
            prices: Arc::new(PriceTable::default()),
        }
    }

    pub fn with_prices(mut self, prices: PriceTable) -> Self {
        self.prices = Arc::new(prices);
        self
    }

    pub fn model(&self) -> &Arc<dyn ChatModel> {
        &self.model
    }

    /// Run every sub-request concurrently and aggregate after all resolved
    pub async fn fan_out(
        &self,
        context: &Map<String, Value>,
        sub_requests: Vec<SubRequest>,
    ) -> Result<AggregatedResult, OrchestratorError> {
        if sub_requests.is_empty() {
            return Err(OrchestratorError::EmptyBatch);
        }
        let mut seen = HashSet::new();
        for sub_request in &sub_requests {
            if !seen.insert(sub_request.label.as_str()) {
                return Err(OrchestratorError::DuplicateLabel(sub_request.label.clone()));
            }
        }

        let batch_id = Uuid::new_v4();
        let labels: Vec<String> = sub_requests.iter().map(|s| s.label.clone()).collect();
        let parallel = sub_requests
            .into_iter()
            .fold(RunnableParallel::new(), |parallel, sub_request| {
                let label = sub_request.label.clone();
                parallel.branch(
                    label,
                    LeafRunnable {
                        sub_request,
                        model: Arc::clone(&self.model),
                        prices: Arc::clone(&self.prices),
                    },
                )
            });

        info!("batch {} dispatching {} leaves: {}", batch_id, labels.len(), labels.join(", "));
        let started = Instant::now();
        let reports = parallel
            .invoke(Arc::new(stringify_context(context)))
            .await
            .map_err(|e| OrchestratorError::Dispatch(e.to_string()))?;
        let execution_time = started.elapsed().as_secs_f64();

        let mut results = BTreeMap::new();
        let mut usage = BTreeMap::new();
        for (label, report) in reports {
            match report {
                Ok(report) => {
                    usage.insert(label.clone(), report.usage);
                    results.insert(label, report.outcome);
                }
                Err(e) => {
                    warn!("batch {} leaf '{}' failed: {}", batch_id, label, e);
                    usage.insert(label.clone(), LeafUsage::none());
                    results.insert(label, LeafOutcome::failed(e.to_string()));
                }
            }
        }

        let token_usage = UsageReport::from_leaves(usage);
        info!(
            "batch {} done in {:.3}s, ~{} tokens",
            batch_id, execution_time, token_usage.total.total_tokens
        );
        Ok(AggregatedResult {
            batch_id,
            results,
            token_usage,
            timestamp: chrono::Utc::now().to_rfc3339(),
            execution_time,
        })
    }

    /// A batch with a single leaf
    pub async fn run_single(
        &self,
        context: &Map<String, Value>,
        sub_request: SubRequest,
    ) -> Result<AggregatedResult, OrchestratorError> {
        self.fan_out(context, vec![sub_request]).await
    }
}
