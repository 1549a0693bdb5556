//! Per-model pricing. Rates are USD per token and are keyed by the short,
//! user-facing model name rather than the provider identifier.

use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelRate {
    pub model: &'static str,
    pub input_per_token: f64,
    pub output_per_token: f64,
}

pub const DEFAULT_RATE_MODEL: &str = "gpt-4o";

// USD per token, i.e. the per-million list price times 1e-6.
pub static MODEL_RATES: &[ModelRate] = &[
    ModelRate {
        model: "gpt-4o",
        input_per_token: 2.50e-6,
        output_per_token: 10.00e-6,
    },
    ModelRate {
        model: "gpt-4o-mini",
        input_per_token: 0.150e-6,
        output_per_token: 0.600e-6,
    },
    ModelRate {
        model: "o1-mini",
        input_per_token: 3.00e-6,
        output_per_token: 12.00e-6,
    },
    ModelRate {
        model: "claude-3-5-sonnet",
        input_per_token: 3.00e-6,
        output_per_token: 15.00e-6,
    },
    ModelRate {
        model: "claude-3-5-haiku",
        input_per_token: 0.80e-6,
        output_per_token: 4.00e-6,
    },
    ModelRate {
        model: "claude-3-sonnet",
        input_per_token: 3.00e-6,
        output_per_token: 15.00e-6,
    },
    ModelRate {
        model: "claude-3-haiku",
        input_per_token: 0.25e-6,
        output_per_token: 1.25e-6,
    },
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub input_cost: f64,
    pub output_cost: f64,
    pub total_cost: f64,
}

pub fn rate_for(model: &str) -> Option<&'static ModelRate> {
    MODEL_RATES.iter().find(|rate| rate.model == model)
}

fn default_rate() -> &'static ModelRate {
    // The table always carries the default entry.
    &MODEL_RATES[0]
}

/// Never fails: unknown models are priced at the default tier and a warning is emitted.
pub fn calculate_cost(input_tokens: u64, output_tokens: u64, model: &str) -> CostBreakdown {
    let rate = rate_for(model).unwrap_or_else(|| {
        warn!(
            model = %model,
            "Unknown model {}, defaulting to {} rates", model, DEFAULT_RATE_MODEL
        );
        default_rate()
    });

    let input_cost = input_tokens as f64 * rate.input_per_token;
    let output_cost = output_tokens as f64 * rate.output_per_token;

    CostBreakdown {
        input_cost,
        output_cost,
        total_cost: input_cost + output_cost,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn logs_while(f: impl FnOnce()) -> String {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        let bytes = logs.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn default_entry_is_first() {
        assert_eq!(default_rate().model, DEFAULT_RATE_MODEL);
    }

    #[test]
    fn total_is_exact_sum() {
        for rate in MODEL_RATES {
            for (input, output) in [(0, 0), (1, 0), (0, 1), (1234, 987), (14_000, 4_000)] {
                let cost = calculate_cost(input, output, rate.model);
                assert_eq!(cost.total_cost, cost.input_cost + cost.output_cost);
                assert!(cost.input_cost >= 0.0 && cost.output_cost >= 0.0);
            }
        }
    }

    #[test]
    fn prices_known_model() {
        let cost = calculate_cost(1_000_000, 1_000_000, "claude-3-5-haiku");
        assert!((cost.input_cost - 0.80).abs() < 1e-9);
        assert!((cost.output_cost - 4.00).abs() < 1e-9);
    }

    #[test]
    fn unknown_model_uses_default_rate() {
        let unknown = calculate_cost(500, 200, "unknown-model-xyz");
        let default = calculate_cost(500, 200, DEFAULT_RATE_MODEL);
        assert_eq!(unknown, default);
    }

    #[test]
    fn unknown_model_is_logged_as_warning() {
        let output = logs_while(|| {
            calculate_cost(500, 200, "unknown-model-xyz");
        });
        assert!(output.contains("WARN"));
        assert!(output.contains("unknown-model-xyz"));

        let output = logs_while(|| {
            calculate_cost(500, 200, "gpt-4o-mini");
        });
        assert!(!output.contains("WARN"));
    }

    #[test]
    fn resolved_identifier_is_priced_at_default_tier() {
        // Full provider identifiers are not table keys; callers must price by short name.
        let by_id = calculate_cost(1000, 1000, "claude-3-5-haiku-20241022");
        let by_short = calculate_cost(1000, 1000, "claude-3-5-haiku");
        assert_ne!(by_id, by_short);
        assert_eq!(by_id, calculate_cost(1000, 1000, DEFAULT_RATE_MODEL));
    }
}
