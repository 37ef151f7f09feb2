//! Token and cost accounting for fan-out batches.
//!
//! The figures here are approximations. When a provider does not report
//! usage, output tokens are estimated as `chars / 3` of the response text and
//! input tokens as twice the output tokens. Estimated entries carry
//! `estimated: true` so callers never mistake them for billing data.
mod pricing;

use serde::Serialize;
use std::collections::BTreeMap;

use crate::models::TokenUsage;

pub use pricing::{ModelPrice, PriceTable};

/// Characters per output token in the heuristic estimate
pub const CHARS_PER_TOKEN: usize = 3;
/// Assumed input/output token ratio when the provider reports nothing
pub const INPUT_OUTPUT_RATIO: usize = 2;

/// Estimate output tokens from the response text
pub fn estimate_output_tokens(text: &str) -> usize {
    text.chars().count() / CHARS_PER_TOKEN
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct LeafUsage {
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub total_tokens: usize,
    pub estimated: bool,
    /// Estimated cost in USD
    pub cost: f64,
}

impl LeafUsage {
    /// Usage of one completed leaf, preferring provider figures
    pub fn from_response(text: &str, reported: Option<&TokenUsage>, model_name: &str, prices: &PriceTable) -> Self {
        let (input_tokens, output_tokens, estimated) = match reported {
            Some(usage) => (usage.prompt_tokens, usage.completion_tokens, false),
            None => {
                let output = estimate_output_tokens(text);
                (output * INPUT_OUTPUT_RATIO, output, true)
            }
        };
        Self {
            input_tokens,
            output_tokens,
            total_tokens: input_tokens + output_tokens,
            estimated,
            cost: prices.cost(model_name, input_tokens, output_tokens),
        }
    }

    /// A leaf that never got a response: zero tokens, nothing estimated
    pub fn none() -> Self {
        Self::default()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct UsageReport {
    pub leaves: BTreeMap<String, LeafUsage>,
    pub total: LeafUsage,
}

impl UsageReport {
    pub fn from_leaves(leaves: BTreeMap<String, LeafUsage>) -> Self {
        let total = leaves.values().fold(
            LeafUsage {
                estimated: false,
                ..LeafUsage::default()
            },
            |acc, leaf| LeafUsage {
                input_tokens: acc.input_tokens + leaf.input_tokens,
                output_tokens: acc.output_tokens + leaf.output_tokens,
                total_tokens: acc.total_tokens + leaf.total_tokens,
                estimated: acc.estimated || leaf.estimated,
                cost: acc.cost + leaf.cost,
            },
        );
        Self { leaves, total }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_output_tokens() {
        assert_eq!(estimate_output_tokens(""), 0);
        assert_eq!(estimate_output_tokens("hello world"), 3); // 11 chars / 3
        // counted in characters, not bytes
        assert_eq!(estimate_output_tokens("오늘의 운세"), 2);
    }

    #[test]
    fn test_heuristic_when_provider_is_silent() {
        let usage = LeafUsage::from_response(&"a".repeat(300), None, "claude-3-opus-20240229", &PriceTable::default());
        assert_eq!(usage.output_tokens, 100);
        assert_eq!(usage.input_tokens, 200);
        assert_eq!(usage.total_tokens, 300);
        assert!(usage.estimated);
        assert!(usage.cost > 0.0);
    }

    #[test]
    fn test_provider_figures_win() {
        let reported = TokenUsage {
            prompt_tokens: 40,
            completion_tokens: 10,
            total_tokens: 50,
        };
        let usage = LeafUsage::from_response("ignored", Some(&reported), "gpt-4o", &PriceTable::default());
        assert_eq!((usage.input_tokens, usage.output_tokens, usage.total_tokens), (40, 10, 50));
        assert!(!usage.estimated);
    }

    #[test]
    fn test_doubling_text_doubles_tokens_and_cost() {
        let prices = PriceTable::default();
        let short = LeafUsage::from_response(&"x".repeat(600), None, "gpt-4o", &prices);
        let long = LeafUsage::from_response(&"x".repeat(1200), None, "gpt-4o", &prices);
        assert_eq!(long.output_tokens, 2 * short.output_tokens);
        assert!((long.cost - 2.0 * short.cost).abs() < 1e-12);
    }

    #[test]
    fn test_report_total_is_sum_of_leaves() {
        let prices = PriceTable::default();
        let leaves = BTreeMap::from([
            ("daily".to_string(), LeafUsage::from_response(&"d".repeat(90), None, "m", &prices)),
            ("weekly".to_string(), LeafUsage::from_response(&"w".repeat(30), None, "m", &prices)),
            ("failed".to_string(), LeafUsage::none()),
        ]);
        let report = UsageReport::from_leaves(leaves);

        let sum: usize = report.leaves.values().map(|l| l.total_tokens).sum();
        assert_eq!(report.total.total_tokens, sum);
        assert_eq!(report.total.total_tokens, 90 + 30);
        assert!(report.total.estimated);
    }

    #[test]
    fn test_failed_leaf_keeps_provider_total_exact() {
        let prices = PriceTable::default();
        let reported = TokenUsage {
            prompt_tokens: 100,
            completion_tokens: 20,
            total_tokens: 120,
        };
        let leaves = BTreeMap::from([
            ("daily".to_string(), LeafUsage::from_response("[]", Some(&reported), "gpt-4o", &prices)),
            ("weekly".to_string(), LeafUsage::none()),
        ]);
        let report = UsageReport::from_leaves(leaves);

        assert!(!report.leaves["weekly"].estimated);
        assert_eq!(report.total.total_tokens, 120);
        assert!(!report.total.estimated);
    }
}
