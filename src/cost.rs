//! Token cost accounting.
//!
//! Pricing is tiered on prompt size: once a single prompt exceeds the long-context
//! threshold, both input and output are billed at the higher rate. Reasoning tokens
//! are billed as output.

use crate::provider::TokenUsage;
use serde::{Deserialize, Serialize};

/// USD per million tokens, with a long-context tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingConfig {
    #[serde(default = "default_input_per_million")]
    pub input_per_million: f64,
    #[serde(default = "default_output_per_million")]
    pub output_per_million: f64,
    #[serde(default = "default_long_context_threshold")]
    pub long_context_threshold: u64,
    #[serde(default = "default_long_input_per_million")]
    pub long_input_per_million: f64,
    #[serde(default = "default_long_output_per_million")]
    pub long_output_per_million: f64,
}

fn default_input_per_million() -> f64 {
    2.0
}

fn default_output_per_million() -> f64 {
    12.0
}

fn default_long_context_threshold() -> u64 {
    200_000
}

fn default_long_input_per_million() -> f64 {
    4.0
}

fn default_long_output_per_million() -> f64 {
    18.0
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            input_per_million: default_input_per_million(),
            output_per_million: default_output_per_million(),
            long_context_threshold: default_long_context_threshold(),
            long_input_per_million: default_long_input_per_million(),
            long_output_per_million: default_long_output_per_million(),
        }
    }
}

impl PricingConfig {
    pub fn validate(&self) -> Result<(), String> {
        let rates = [
            self.input_per_million,
            self.output_per_million,
            self.long_input_per_million,
            self.long_output_per_million,
        ];
        if rates.iter().any(|r| !r.is_finite() || *r < 0.0) {
            return Err("Pricing rates must be non-negative numbers".to_string());
        }
        Ok(())
    }

    /// Cost of a single call.
    pub fn cost(&self, usage: &TokenUsage) -> CostReport {
        let long_context = usage.prompt_tokens > self.long_context_threshold;
        let (input_rate, output_rate) = if long_context {
            (self.long_input_per_million, self.long_output_per_million)
        } else {
            (self.input_per_million, self.output_per_million)
        };
        let output_tokens = usage.completion_tokens + usage.reasoning_tokens;
        let input_cost = usage.prompt_tokens as f64 / 1_000_000.0 * input_rate;
        let output_cost = output_tokens as f64 / 1_000_000.0 * output_rate;
        CostReport {
            long_context,
            prompt_tokens: usage.prompt_tokens,
            output_tokens,
            input_cost,
            output_cost,
            total_cost: input_cost + output_cost,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CostReport {
    pub long_context: bool,
    pub prompt_tokens: u64,
    pub output_tokens: u64,
    pub input_cost: f64,
    pub output_cost: f64,
    pub total_cost: f64,
}

/// Running total across a run. Owned by the run aggregator.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CostTotals {
    pub prompt_tokens: u64,
    pub output_tokens: u64,
    pub total_cost: f64,
}

impl CostTotals {
    pub fn add(&mut self, report: &CostReport) {
        self.prompt_tokens += report.prompt_tokens;
        self.output_tokens += report.output_tokens;
        self.total_cost += report.total_cost;
    }
}
