//! Flat-rate usage and cost strategies backed by [`UsageCounter`].

use brainstem_core::{
    Cost, LlmAccumulation, ModelUsage, ToolAccumulation, Usage, UsageCounter,
};
use brainstem_runtime::{CostCalculator, CostContext, UsageCalculator, UsageOperation};

/// Prices every model token and every tool call at a fixed rate.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatRatePricing {
    pub provider: String,
    pub model: String,
    pub cost_per_token: f64,
    pub cost_per_tool_call: f64,
}

impl FlatRatePricing {
    pub fn new(provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
            cost_per_token: 0.0,
            cost_per_tool_call: 0.0,
        }
    }

    pub fn with_cost_per_token(mut self, cost: f64) -> Self {
        self.cost_per_token = cost;
        self
    }

    pub fn with_cost_per_tool_call(mut self, cost: f64) -> Self {
        self.cost_per_tool_call = cost;
        self
    }

    fn priced_model_usage(&self, reported: Option<&ModelUsage>) -> ModelUsage {
        let usage = reported.cloned().unwrap_or_default();
        let tokens = usage.total_tokens.unwrap_or(0) as f64;
        if self.cost_per_token > 0.0 {
            usage.with_cost(tokens * self.cost_per_token)
        } else {
            usage
        }
    }

    fn tool_cost(&self) -> Option<f64> {
        (self.cost_per_tool_call > 0.0).then_some(self.cost_per_tool_call)
    }
}

impl UsageCalculator for FlatRatePricing {
    fn calculate_usage(&self, operation: &UsageOperation<'_>, previous: &Usage) -> Usage {
        match operation {
            UsageOperation::Llm { output, .. } => {
                let model_usage = self.priced_model_usage(output.usage.as_ref());
                UsageCounter::accumulate_llm(LlmAccumulation {
                    usage: Some(previous),
                    cost: None,
                    provider: &self.provider,
                    model: &self.model,
                    model_usage: &model_usage,
                })
                .usage
            }
            UsageOperation::Tool {
                tool_call,
                execution_time_ms,
                ..
            } => {
                UsageCounter::accumulate_tool(ToolAccumulation {
                    usage: Some(previous),
                    cost: None,
                    tool_name: tool_call.name(),
                    execution_time_ms: *execution_time_ms,
                    success: true,
                    tool_cost: None,
                })
                .usage
            }
        }
    }
}

impl CostCalculator for FlatRatePricing {
    fn calculate_cost(&self, context: &CostContext<'_>) -> Cost {
        let accumulated = match context.operation {
            UsageOperation::Llm { output, .. } => {
                let model_usage = self.priced_model_usage(output.usage.as_ref());
                UsageCounter::accumulate_llm(LlmAccumulation {
                    usage: Some(context.usage),
                    cost: Some(context.previous_cost),
                    provider: &self.provider,
                    model: &self.model,
                    model_usage: &model_usage,
                })
            }
            UsageOperation::Tool { tool_call, .. } => {
                UsageCounter::accumulate_tool(ToolAccumulation {
                    usage: Some(context.usage),
                    cost: Some(context.previous_cost),
                    tool_name: tool_call.name(),
                    execution_time_ms: 0,
                    success: true,
                    tool_cost: self.tool_cost(),
                })
            }
        };
        accumulated
            .cost
            .unwrap_or_else(|| context.previous_cost.clone())
    }
}
