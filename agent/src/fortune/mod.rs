//! Fortune telling prompts: four period leaves fanned out in parallel, or
//! one combined prompt asking for all periods at once.
use log::warn;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::orchestrator::{AggregatedResult, LeafOutcome, SubRequest};
use crate::parsers::JsonOutputParser;
use crate::prompt::{PromptError, PromptTemplate};
use crate::usage::UsageReport;

/// Items per period, one per category
pub const ITEMS_PER_PERIOD: usize = 5;
pub const COMBINED_LABEL: &str = "combined";

const CATEGORIES: &str = "overall, love, wealth, health, career";

const PERIOD_TEMPLATE: &str = "You are an experienced fortune teller.
Read the {period} fortune for the person below, looking ahead over {horizon}.

Person: {user_info}

Cover these categories in this order: {categories}.
1. Return only JSON
2. Return a JSON array of exactly {item_count} objects with this structure:
{format_instructions}";

const COMBINED_TEMPLATE: &str = "You are an experienced fortune teller.
Read the fortune for all four periods (daily, weekly, monthly, yearly) for the person below.

Person: {user_info}

For every period cover these categories in this order: {categories}.
1. Return only JSON
2. Return a JSON object whose keys are daily, weekly, monthly and yearly,
each holding an array of exactly {item_count} objects with this structure:
{format_instructions}";

const ITEM_FORMAT: &str = r#"[
  {"category": "overall", "title": "short headline", "content": "two or three sentences", "score": 0-100},
  ...
]"#;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Period {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Period {
    pub const ALL: [Period; 4] = [Period::Daily, Period::Weekly, Period::Monthly, Period::Yearly];

    pub fn label(self) -> &'static str {
        match self {
            Period::Daily => "daily",
            Period::Weekly => "weekly",
            Period::Monthly => "monthly",
            Period::Yearly => "yearly",
        }
    }

    fn horizon(self) -> &'static str {
        match self {
            Period::Daily => "the next 24 hours",
            Period::Weekly => "the next seven days",
            Period::Monthly => "the coming month",
            Period::Yearly => "the coming twelve months",
        }
    }
}

fn shared_partials() -> HashMap<String, String> {
    HashMap::from([
        ("categories".to_string(), CATEGORIES.to_string()),
        ("item_count".to_string(), ITEMS_PER_PERIOD.to_string()),
        ("format_instructions".to_string(), ITEM_FORMAT.to_string()),
    ])
}

pub fn period_template(period: Period) -> Result<PromptTemplate, PromptError> {
    let mut partials = shared_partials();
    partials.insert("period".to_string(), period.label().to_string());
    partials.insert("horizon".to_string(), period.horizon().to_string());
    PromptTemplate::new(PERIOD_TEMPLATE, vec!["user_info".to_string()], partials)
}

// Shape every period reply must have: one item per category
fn period_parser() -> JsonOutputParser {
    JsonOutputParser::new().expect_array_len(ITEMS_PER_PERIOD)
}

/// The four period leaves, in `Period::ALL` order
pub fn fortune_sub_requests() -> Result<Vec<SubRequest>, PromptError> {
    Period::ALL
        .iter()
        .map(|period| -> Result<SubRequest, PromptError> {
            Ok(SubRequest::new(
                period.label(),
                period_template(*period)?,
                period_parser(),
            ))
        })
        .collect()
}

/// One leaf asking for every period in a single reply
pub fn combined_sub_request() -> Result<SubRequest, PromptError> {
    let template = PromptTemplate::new(COMBINED_TEMPLATE, vec!["user_info".to_string()], shared_partials())?;
    let keys: Vec<&str> = Period::ALL.iter().map(|p| p.label()).collect();
    Ok(SubRequest::new(
        COMBINED_LABEL,
        template,
        JsonOutputParser::new().expect_keys(&keys),
    ))
}

pub fn fortune_context(user_info: &str) -> Map<String, Value> {
    let mut context = Map::new();
    context.insert("user_info".to_string(), Value::String(user_info.to_string()));
    context
}

#[derive(Clone, Debug, Serialize)]
pub struct FortuneResults {
    pub daily: LeafOutcome,
    pub weekly: LeafOutcome,
    pub monthly: LeafOutcome,
    pub yearly: LeafOutcome,
}

impl FortuneResults {
    fn from_fn(mut outcome_for: impl FnMut(Period) -> LeafOutcome) -> Self {
        Self {
            daily: outcome_for(Period::Daily),
            weekly: outcome_for(Period::Weekly),
            monthly: outcome_for(Period::Monthly),
            yearly: outcome_for(Period::Yearly),
        }
    }

    pub fn get(&self, period: Period) -> &LeafOutcome {
        match period {
            Period::Daily => &self.daily,
            Period::Weekly => &self.weekly,
            Period::Monthly => &self.monthly,
            Period::Yearly => &self.yearly,
        }
    }
}

/// Response payload of both fortune endpoints
#[derive(Clone, Debug, Serialize)]
pub struct FortuneTelling {
    pub user_info: String,
    pub results: FortuneResults,
    pub timestamp: String,
    pub token_usage: UsageReport,
    pub execution_time: f64,
}

impl FortuneTelling {
    /// Assemble from a batch built with [`fortune_sub_requests`]
    pub fn from_parallel(user_info: String, mut aggregate: AggregatedResult) -> Self {
        let results = FortuneResults::from_fn(|period| {
            aggregate
                .results
                .remove(period.label())
                .unwrap_or_else(|| LeafOutcome::failed(format!("no '{}' leaf in batch", period.label())))
        });
        Self {
            user_info,
            results,
            timestamp: aggregate.timestamp,
            token_usage: aggregate.token_usage,
            execution_time: aggregate.execution_time,
        }
    }

    /// Assemble from a batch built with [`combined_sub_request`].
    ///
    /// A parsed combined reply is split per period and each period is held
    /// to the same shape as a parallel leaf; a wrong-shaped period keeps its
    /// JSON text as unparsed. An unparsed or failed reply is copied into
    /// every period.
    pub fn from_combined(user_info: String, mut aggregate: AggregatedResult) -> Self {
        let combined = aggregate
            .results
            .remove(COMBINED_LABEL)
            .unwrap_or_else(|| LeafOutcome::failed(format!("no '{}' leaf in batch", COMBINED_LABEL)));
        let parser = period_parser();
        let results = FortuneResults::from_fn(|period| match &combined {
            LeafOutcome::Parsed(value) => match value.get(period.label()) {
                Some(items) => match parser.validate(items) {
                    Ok(()) => LeafOutcome::Parsed(items.clone()),
                    Err(e) => {
                        warn!("combined reply period '{}' left unparsed: {}", period.label(), e);
                        LeafOutcome::Unparsed { raw: items.to_string() }
                    }
                },
                None => LeafOutcome::failed(format!("combined reply has no '{}' entry", period.label())),
            },
            other => other.clone(),
        });
        Self {
            user_info,
            results,
            timestamp: aggregate.timestamp,
            token_usage: aggregate.token_usage,
            execution_time: aggregate.execution_time,
        }
    }
}
