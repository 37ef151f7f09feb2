// Static per-model price table, USD per one million tokens
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ModelPrice {
    pub input_per_million: f64,
    pub output_per_million: f64,
}

impl ModelPrice {
    pub const fn new(input_per_million: f64, output_per_million: f64) -> Self {
        Self {
            input_per_million,
            output_per_million,
        }
    }
}

/// Prices keyed by model name prefix, longest prefix wins.
#[derive(Clone, Debug)]
pub struct PriceTable {
    entries: Vec<(String, ModelPrice)>,
    fallback: ModelPrice,
}

impl PriceTable {
    pub fn new(fallback: ModelPrice) -> Self {
        Self {
            entries: Vec::new(),
            fallback,
        }
    }

    pub fn with_price(mut self, prefix: impl Into<String>, price: ModelPrice) -> Self {
        self.entries.push((prefix.into(), price));
        self
    }

    pub fn price_for(&self, model_name: &str) -> ModelPrice {
        self.entries
            .iter()
            .filter(|(prefix, _)| model_name.starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, price)| *price)
            .unwrap_or(self.fallback)
    }

    pub fn cost(&self, model_name: &str, input_tokens: usize, output_tokens: usize) -> f64 {
        let price = self.price_for(model_name);
        (input_tokens as f64 * price.input_per_million + output_tokens as f64 * price.output_per_million) / 1_000_000.0
    }
}

impl Default for PriceTable {
    fn default() -> Self {
        PriceTable::new(ModelPrice::new(3.0, 15.0))
            .with_price("claude-3-opus", ModelPrice::new(15.0, 75.0))
            .with_price("claude-3-5-sonnet", ModelPrice::new(3.0, 15.0))
            .with_price("claude-3-sonnet", ModelPrice::new(3.0, 15.0))
            .with_price("claude-3-haiku", ModelPrice::new(0.25, 1.25))
            .with_price("gpt-4o", ModelPrice::new(2.5, 10.0))
            .with_price("gpt-4o-mini", ModelPrice::new(0.15, 0.6))
            .with_price("gpt-4-turbo", ModelPrice::new(10.0, 30.0))
            .with_price("gpt-3.5-turbo", ModelPrice::new(0.5, 1.5))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_longest_prefix_wins() {
        let table = PriceTable::default();
        assert_eq!(table.price_for("gpt-4o-mini-2024-07-18"), ModelPrice::new(0.15, 0.6));
        assert_eq!(table.price_for("gpt-4o-2024-08-06"), ModelPrice::new(2.5, 10.0));
        assert_eq!(table.price_for("claude-3-opus-20240229"), ModelPrice::new(15.0, 75.0));
    }

    #[test]
    fn test_unknown_model_uses_fallback() {
        let table = PriceTable::new(ModelPrice::new(1.0, 2.0));
        assert_eq!(table.price_for("mystery"), ModelPrice::new(1.0, 2.0));
        assert!((table.cost("mystery", 1_000_000, 500_000) - 2.0).abs() < 1e-9);
    }
}
