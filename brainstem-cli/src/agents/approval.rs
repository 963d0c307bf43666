use std::sync::Arc;

use async_trait::async_trait;
use brainstem::{
    Agent, AgentInstruction, AgentRuntime, AgentState, FinishReason, FnModelRuntime, MessageRole,
    ModelChunk, ModelRuntime, Phase, Plan, RuntimeContext, RuntimeResult, RuntimeSettings,
    ToolError, ToolRegistry, ToolsCalling,
};
use futures::StreamExt;
use futures::stream;
use serde_json::{Value, json};

use super::{conversation_payload, drive, last_message};

pub async fn run_approval_agent(settings: &RuntimeSettings, input: &str) -> AgentState {
    let agent = ApprovalAgent::new();
    let runtime = AgentRuntime::new(Arc::new(agent));
    drive(&runtime, settings, input).await
}

/// Asks the model, which requests the `uppercase` tool; every tool call
/// goes through human approval before it runs.
struct ApprovalAgent {
    model: Box<dyn ModelRuntime>,
    tools: ToolRegistry,
}

async fn uppercase(args: Value) -> Result<Value, ToolError> {
    let text = args["text"]
        .as_str()
        .ok_or_else(|| ToolError::InvalidInput("missing 'text'".to_string()))?;
    Ok(json!(text.to_uppercase()))
}

impl ApprovalAgent {
    fn new() -> Self {
        let model = FnModelRuntime::new(|payload| {
            let chunk = match last_message(&payload) {
                Some(message) if message.role == MessageRole::Tool => {
                    ModelChunk::text(format!("The tool answered {}", message.content))
                }
                Some(message) => ModelChunk::tool_calls(vec![ToolsCalling::new(
                    "call_1",
                    "uppercase",
                    json!({ "text": message.content }).to_string(),
                )]),
                None => ModelChunk::text("Nothing to do."),
            };
            stream::iter(vec![Ok(chunk)]).boxed()
        });

        Self {
            model: Box::new(model),
            tools: ToolRegistry::new().with_fn("uppercase", uppercase),
        }
    }
}

#[async_trait]
impl Agent for ApprovalAgent {
    async fn runner(&self, context: &RuntimeContext, state: &AgentState) -> RuntimeResult<Plan> {
        let instruction = match &context.phase {
            Phase::Init | Phase::UserInput { .. } | Phase::ToolResult { .. } => {
                AgentInstruction::call_llm(conversation_payload(state))
            }
            Phase::LlmResult {
                tool_calls: Some(calls),
                ..
            } if !calls.is_empty() => AgentInstruction::RequestHumanApprove {
                pending_tools_calling: calls.clone(),
            },
            Phase::Error { error, .. } => {
                AgentInstruction::finish(FinishReason::ErrorRecovery, Some(error.message.clone()))
            }
            _ => AgentInstruction::finish(FinishReason::Completed, None),
        };
        Ok(instruction.into())
    }

    fn tools(&self) -> Option<&ToolRegistry> {
        Some(&self.tools)
    }

    fn model_runtime(&self) -> Option<&dyn ModelRuntime> {
        Some(self.model.as_ref())
    }
}
