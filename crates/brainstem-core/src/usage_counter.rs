//! Pure accumulation of usage and cost.
//!
//! Both entry points borrow their inputs and return fresh values, so a caller
//! holding the previous `Usage`/`Cost` keeps it untouched. Cost stays absent
//! until the first priced operation: free tools and local models never force
//! a cost record into existence.

use chrono::Utc;
use tracing::trace;

use crate::usage::{Cost, ModelCostEntry, ModelUsage, ToolCostEntry, ToolUsageEntry, Usage};

/// Input of [`UsageCounter::accumulate_llm`].
#[derive(Debug, Clone, Copy)]
pub struct LlmAccumulation<'a> {
    pub usage: Option<&'a Usage>,
    pub cost: Option<&'a Cost>,
    pub provider: &'a str,
    pub model: &'a str,
    pub model_usage: &'a ModelUsage,
}

/// Input of [`UsageCounter::accumulate_tool`].
#[derive(Debug, Clone, Copy)]
pub struct ToolAccumulation<'a> {
    pub usage: Option<&'a Usage>,
    pub cost: Option<&'a Cost>,
    pub tool_name: &'a str,
    pub execution_time_ms: u64,
    pub success: bool,
    pub tool_cost: Option<f64>,
}

/// Result of an accumulation.
#[derive(Debug, Clone, PartialEq)]
pub struct Accumulated {
    pub usage: Usage,
    pub cost: Option<Cost>,
}

/// Stateless usage and cost accumulator.
pub struct UsageCounter;

impl UsageCounter {
    /// Record one model call.
    pub fn accumulate_llm(input: LlmAccumulation<'_>) -> Accumulated {
        let mut usage = input.usage.cloned().unwrap_or_default();
        let model_usage = input.model_usage;

        usage.llm.api_calls += 1;
        usage.llm.tokens.input += model_usage.total_input_tokens.unwrap_or(0);
        usage.llm.tokens.output += model_usage.total_output_tokens.unwrap_or(0);
        usage.llm.tokens.total += model_usage.total_tokens.unwrap_or(0);

        let Some(call_cost) = model_usage.cost else {
            return Accumulated {
                usage,
                cost: input.cost.cloned(),
            };
        };

        let mut cost = input.cost.cloned().unwrap_or_default();
        let id = format!("{}/{}", input.provider, input.model);

        match cost.llm.by_model.iter_mut().find(|entry| entry.id == id) {
            Some(entry) => {
                entry.usage = entry.usage.merge(model_usage);
                entry.total_cost += call_cost;
            }
            None => cost.llm.by_model.push(ModelCostEntry {
                id: id.clone(),
                model: input.model.to_string(),
                provider: input.provider.to_string(),
                total_cost: call_cost,
                usage: ModelUsage::default().merge(model_usage),
            }),
        }

        cost.llm.total += call_cost;
        cost.total = cost.llm.total + cost.tools.total;
        cost.calculated_at = Utc::now();

        trace!(model = %id, call_cost, total = cost.total, "accumulated llm cost");

        Accumulated {
            usage,
            cost: Some(cost),
        }
    }

    /// Record one tool execution.
    pub fn accumulate_tool(input: ToolAccumulation<'_>) -> Accumulated {
        let mut usage = input.usage.cloned().unwrap_or_default();

        let entry = match usage
            .tools
            .by_tool
            .iter()
            .position(|entry| entry.name == input.tool_name)
        {
            Some(idx) => &mut usage.tools.by_tool[idx],
            None => {
                usage
                    .tools
                    .by_tool
                    .push(ToolUsageEntry::new(input.tool_name));
                let last = usage.tools.by_tool.len() - 1;
                &mut usage.tools.by_tool[last]
            }
        };
        entry.calls += 1;
        entry.total_time_ms += input.execution_time_ms;
        if !input.success {
            entry.errors += 1;
        }

        usage.tools.total_calls += 1;
        usage.tools.total_time_ms += input.execution_time_ms;

        let Some(call_cost) = input.tool_cost else {
            return Accumulated {
                usage,
                cost: input.cost.cloned(),
            };
        };

        let mut cost = input.cost.cloned().unwrap_or_default();
        match cost
            .tools
            .by_tool
            .iter_mut()
            .find(|entry| entry.name == input.tool_name)
        {
            Some(entry) => {
                entry.calls += 1;
                entry.total_cost += call_cost;
            }
            None => cost.tools.by_tool.push(ToolCostEntry {
                name: input.tool_name.to_string(),
                calls: 1,
                currency: cost.tools.currency.clone(),
                total_cost: call_cost,
            }),
        }

        cost.tools.total += call_cost;
        cost.total = cost.llm.total + cost.tools.total;
        cost.calculated_at = Utc::now();

        trace!(tool = input.tool_name, call_cost, total = cost.total, "accumulated tool cost");

        Accumulated {
            usage,
            cost: Some(cost),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn llm<'a>(
        usage: Option<&'a Usage>,
        cost: Option<&'a Cost>,
        model_usage: &'a ModelUsage,
    ) -> LlmAccumulation<'a> {
        LlmAccumulation {
            usage,
            cost,
            provider: "openai",
            model: "gpt-4",
            model_usage,
        }
    }

    fn tool<'a>(
        usage: Option<&'a Usage>,
        cost: Option<&'a Cost>,
        success: bool,
        tool_cost: Option<f64>,
    ) -> ToolAccumulation<'a> {
        ToolAccumulation {
            usage,
            cost,
            tool_name: "search",
            execution_time_ms: 120,
            success,
            tool_cost,
        }
    }

    #[test]
    fn test_llm_tokens_without_cost() {
        let model_usage = ModelUsage::with_totals(100, 50, 150);
        let out = UsageCounter::accumulate_llm(llm(None, None, &model_usage));

        assert_eq!(out.usage.llm.tokens.input, 100);
        assert_eq!(out.usage.llm.tokens.output, 50);
        assert_eq!(out.usage.llm.tokens.total, 150);
        assert_eq!(out.usage.llm.api_calls, 1);
        assert!(out.cost.is_none());
    }

    #[test]
    fn test_llm_cost_merges_into_one_bucket() {
        let first = ModelUsage::with_totals(100, 50, 150).with_cost(0.05);
        let second = ModelUsage::with_totals(50, 25, 75).with_cost(0.03);

        let a = UsageCounter::accumulate_llm(llm(None, None, &first));
        let b = UsageCounter::accumulate_llm(llm(Some(&a.usage), a.cost.as_ref(), &second));

        let cost = b.cost.unwrap();
        assert_eq!(cost.llm.by_model.len(), 1);
        let entry = &cost.llm.by_model[0];
        assert_eq!(entry.id, "openai/gpt-4");
        assert_eq!(entry.provider, "openai");
        assert_eq!(entry.model, "gpt-4");
        assert!(approx(entry.total_cost, 0.08));
        assert_eq!(entry.usage.total_input_tokens, Some(150));
        assert!(approx(entry.usage.cost.unwrap(), 0.08));
        assert!(approx(cost.llm.total, 0.08));
        assert!(approx(cost.total, 0.08));
        assert_eq!(b.usage.llm.api_calls, 2);
    }

    #[test]
    fn test_llm_merge_only_includes_reported_fields() {
        let first = ModelUsage {
            cost: Some(0.05),
            total_input_tokens: Some(100),
            ..Default::default()
        };
        let second = ModelUsage {
            cost: Some(0.03),
            total_output_tokens: Some(50),
            ..Default::default()
        };

        let a = UsageCounter::accumulate_llm(llm(None, None, &first));
        let b = UsageCounter::accumulate_llm(llm(Some(&a.usage), a.cost.as_ref(), &second));
        let merged = &b.cost.unwrap().llm.by_model[0].usage;

        assert_eq!(merged.total_input_tokens, Some(100));
        assert_eq!(merged.total_output_tokens, Some(50));
        assert_eq!(merged.total_tokens, None);
        assert_eq!(merged.input_cached_tokens, None);
    }

    #[test]
    fn test_separate_models_get_separate_buckets() {
        let usage = ModelUsage::with_totals(1, 1, 2).with_cost(0.01);
        let a = UsageCounter::accumulate_llm(llm(None, None, &usage));
        let b = UsageCounter::accumulate_llm(LlmAccumulation {
            provider: "anthropic",
            model: "claude",
            ..llm(Some(&a.usage), a.cost.as_ref(), &usage)
        });
        let ids: Vec<_> = b
            .cost
            .unwrap()
            .llm
            .by_model
            .iter()
            .map(|e| e.id.clone())
            .collect();
        assert_eq!(ids, vec!["openai/gpt-4", "anthropic/claude"]);
    }

    #[test]
    fn test_tool_usage_counts_errors_only_on_failure() {
        let a = UsageCounter::accumulate_tool(tool(None, None, true, None));
        let b = UsageCounter::accumulate_tool(tool(Some(&a.usage), None, false, None));

        let entry = &b.usage.tools.by_tool[0];
        assert_eq!(entry.name, "search");
        assert_eq!(entry.calls, 2);
        assert_eq!(entry.errors, 1);
        assert_eq!(entry.total_time_ms, 240);
        assert_eq!(b.usage.tools.total_calls, 2);
        assert_eq!(b.usage.tools.total_time_ms, 240);
        assert!(b.cost.is_none());
    }

    #[test]
    fn test_tool_cost_bucket() {
        let a = UsageCounter::accumulate_tool(tool(None, None, true, Some(0.01)));
        let b = UsageCounter::accumulate_tool(tool(Some(&a.usage), a.cost.as_ref(), true, Some(0.02)));

        let cost = b.cost.unwrap();
        let entry = &cost.tools.by_tool[0];
        assert_eq!(entry.calls, 2);
        assert_eq!(entry.currency, "USD");
        assert!(approx(entry.total_cost, 0.03));
        assert!(approx(cost.tools.total, 0.03));
        assert!(approx(cost.total, 0.03));
    }

    #[test]
    fn test_mixed_llm_and_tool_cost_total() {
        let model_usage = ModelUsage::with_totals(10, 10, 20).with_cost(0.05);
        let a = UsageCounter::accumulate_llm(llm(None, None, &model_usage));
        let b = UsageCounter::accumulate_tool(tool(Some(&a.usage), a.cost.as_ref(), true, Some(0.01)));

        let cost = b.cost.unwrap();
        assert!(approx(cost.total, 0.06));
        assert_eq!(cost.total, cost.llm.total + cost.tools.total);
    }

    #[test]
    fn test_inputs_are_left_untouched() {
        let model_usage = ModelUsage::with_totals(10, 10, 20).with_cost(0.05);
        let usage = Usage::default();
        let cost = Cost::default();
        let usage_before = usage.clone();
        let cost_before = cost.clone();

        let out = UsageCounter::accumulate_llm(llm(Some(&usage), Some(&cost), &model_usage));

        assert_eq!(usage, usage_before);
        assert_eq!(cost, cost_before);
        assert_ne!(out.usage, usage);
    }
}
