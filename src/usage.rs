use serde::{Deserialize, Serialize};

use crate::cost::CostBreakdown;

/// Token counts normalized from either provider's usage envelope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

impl TokenUsage {
    pub fn new(prompt_tokens: u64, completion_tokens: u64) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// Running totals for one keyword's run. Only grows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RunUsageTotals {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cost: f64,
}

impl RunUsageTotals {
    pub fn record(&mut self, usage: &TokenUsage, cost: &CostBreakdown) {
        self.input_tokens += usage.prompt_tokens;
        self.output_tokens += usage.completion_tokens;
        self.cost += cost.total_cost;
    }

    pub fn total_tokens(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::calculate_cost;

    #[test]
    fn total_is_sum_of_parts() {
        let usage = TokenUsage::new(100, 50);
        assert_eq!(usage.total_tokens, 150);
    }

    #[test]
    fn totals_accumulate_across_calls() {
        let mut totals = RunUsageTotals::default();
        let first = TokenUsage::new(120, 80);
        let second = TokenUsage::new(90, 60);
        totals.record(&first, &calculate_cost(120, 80, "gpt-4o"));
        totals.record(&second, &calculate_cost(90, 60, "gpt-4o-mini"));

        assert_eq!(totals.input_tokens, 210);
        assert_eq!(totals.output_tokens, 140);
        assert_eq!(totals.total_tokens(), 350);
        let expected = calculate_cost(120, 80, "gpt-4o").total_cost
            + calculate_cost(90, 60, "gpt-4o-mini").total_cost;
        assert_eq!(totals.cost, expected);
    }
}
