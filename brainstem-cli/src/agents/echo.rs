use std::sync::Arc;

use async_trait::async_trait;
use brainstem::testing::FlatRatePricing;
use brainstem::{
    Agent, AgentInstruction, AgentRuntime, AgentState, CostCalculator, FinishReason,
    FnModelRuntime, ModelChunk, ModelRuntime, ModelUsage, Phase, Plan, RuntimeContext,
    RuntimeResult, RuntimeSettings, UsageCalculator,
};
use futures::StreamExt;
use futures::stream;

use super::{conversation_payload, drive, last_message};

pub async fn run_echo_agent(settings: &RuntimeSettings, input: &str) -> AgentState {
    let agent = EchoAgent::new();
    let runtime = AgentRuntime::new(Arc::new(agent));
    drive(&runtime, settings, input).await
}

/// Streams the last message back word by word, then finishes.
struct EchoAgent {
    model: Box<dyn ModelRuntime>,
    pricing: FlatRatePricing,
}

impl EchoAgent {
    fn new() -> Self {
        let model = FnModelRuntime::new(|payload| {
            let text = last_message(&payload)
                .map(|message| message.content)
                .unwrap_or_default();
            let words: Vec<String> = text.split_whitespace().map(|w| format!("{w} ")).collect();
            let count = words.len() as u64;

            let mut chunks: Vec<RuntimeResult<ModelChunk>> =
                words.into_iter().map(|w| Ok(ModelChunk::text(w))).collect();
            chunks.push(Ok(ModelChunk::usage(ModelUsage::with_totals(
                count,
                count,
                count * 2,
            ))));
            stream::iter(chunks).boxed()
        });

        Self {
            model: Box::new(model),
            pricing: FlatRatePricing::new("local", "echo").with_cost_per_token(0.0001),
        }
    }
}

#[async_trait]
impl Agent for EchoAgent {
    async fn runner(&self, context: &RuntimeContext, state: &AgentState) -> RuntimeResult<Plan> {
        let instruction = match &context.phase {
            Phase::Init | Phase::UserInput { .. } => {
                AgentInstruction::call_llm(conversation_payload(state))
            }
            Phase::Error { error, .. } => {
                AgentInstruction::finish(FinishReason::ErrorRecovery, Some(error.message.clone()))
            }
            _ => AgentInstruction::finish(FinishReason::Completed, None),
        };
        Ok(instruction.into())
    }

    fn model_runtime(&self) -> Option<&dyn ModelRuntime> {
        Some(self.model.as_ref())
    }

    fn usage_calculator(&self) -> Option<&dyn UsageCalculator> {
        Some(&self.pricing)
    }

    fn cost_calculator(&self) -> Option<&dyn CostCalculator> {
        Some(&self.pricing)
    }
}
