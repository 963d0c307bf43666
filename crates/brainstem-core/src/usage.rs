//! Usage counters and monetary cost records attached to an agent session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default currency for freshly created cost records.
pub const DEFAULT_CURRENCY: &str = "USD";

/// Aggregated resource usage of a session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    pub human_interaction: HumanInteractionUsage,
    pub llm: LlmUsage,
    pub tools: ToolsUsage,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HumanInteractionUsage {
    pub approval_requests: u64,
    pub prompt_requests: u64,
    pub select_requests: u64,
    pub total_waiting_time_ms: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmUsage {
    pub api_calls: u64,
    pub processing_time_ms: u64,
    pub tokens: TokenUsage,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input: u64,
    pub output: u64,
    pub total: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolsUsage {
    pub by_tool: Vec<ToolUsageEntry>,
    pub total_calls: u64,
    pub total_time_ms: u64,
}

/// Per-tool usage bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolUsageEntry {
    pub name: String,
    pub calls: u64,
    pub errors: u64,
    pub total_time_ms: u64,
}

impl ToolUsageEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            calls: 0,
            errors: 0,
            total_time_ms: 0,
        }
    }
}

/// Monetary cost of a session, broken down per model and per tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cost {
    pub calculated_at: DateTime<Utc>,
    pub currency: String,
    pub llm: LlmCost,
    pub tools: ToolsCost,
    pub total: f64,
}

impl Default for Cost {
    fn default() -> Self {
        Self {
            calculated_at: Utc::now(),
            currency: DEFAULT_CURRENCY.to_string(),
            llm: LlmCost::default(),
            tools: ToolsCost::default(),
            total: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmCost {
    pub by_model: Vec<ModelCostEntry>,
    pub currency: String,
    pub total: f64,
}

impl Default for LlmCost {
    fn default() -> Self {
        Self {
            by_model: Vec::new(),
            currency: DEFAULT_CURRENCY.to_string(),
            total: 0.0,
        }
    }
}

/// Cost bucket keyed by `"<provider>/<model>"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelCostEntry {
    pub id: String,
    pub model: String,
    pub provider: String,
    pub total_cost: f64,
    pub usage: ModelUsage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolsCost {
    pub by_tool: Vec<ToolCostEntry>,
    pub currency: String,
    pub total: f64,
}

impl Default for ToolsCost {
    fn default() -> Self {
        Self {
            by_tool: Vec::new(),
            currency: DEFAULT_CURRENCY.to_string(),
            total: 0.0,
        }
    }
}

/// Cost bucket keyed by tool name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCostEntry {
    pub name: String,
    pub calls: u64,
    pub currency: String,
    pub total_cost: f64,
}

/// Token and cost figures reported by a model provider for one call.
///
/// Every field is optional: providers only report what they measure, and a
/// merged record only carries fields that at least one side reported.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelUsage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accepted_prediction_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_audio_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_cache_miss_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_cached_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_citation_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_image_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_text_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_write_cache_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_audio_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_image_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_reasoning_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_text_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejected_prediction_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_input_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_output_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<u64>,
}

macro_rules! merge_model_usage {
    ($prev:expr, $cur:expr; $($field:ident),+ $(,)?) => {
        ModelUsage {
            $($field: merge_field($prev.$field, $cur.$field),)+
        }
    };
}

/// Sum two optional counters; absent on both sides stays absent.
fn merge_field<T>(prev: Option<T>, cur: Option<T>) -> Option<T>
where
    T: Default + std::ops::Add<Output = T>,
{
    match (prev, cur) {
        (None, None) => None,
        (prev, cur) => Some(prev.unwrap_or_default() + cur.unwrap_or_default()),
    }
}

impl ModelUsage {
    /// Convenience constructor for the aggregate token counters.
    pub fn with_totals(input: u64, output: u64, total: u64) -> Self {
        Self {
            total_input_tokens: Some(input),
            total_output_tokens: Some(output),
            total_tokens: Some(total),
            ..Self::default()
        }
    }

    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = Some(cost);
        self
    }

    /// Field-wise merge of two usage records.
    pub fn merge(&self, other: &ModelUsage) -> ModelUsage {
        merge_model_usage!(self, other;
            cost,
            accepted_prediction_tokens,
            input_audio_tokens,
            input_cache_miss_tokens,
            input_cached_tokens,
            input_citation_tokens,
            input_image_tokens,
            input_text_tokens,
            input_write_cache_tokens,
            output_audio_tokens,
            output_image_tokens,
            output_reasoning_tokens,
            output_text_tokens,
            rejected_prediction_tokens,
            total_input_tokens,
            total_output_tokens,
            total_tokens,
        )
    }
}
