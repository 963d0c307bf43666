use async_trait::async_trait;
use brainstem_core::{
    AgentEvent, AgentInstruction, AgentState, AgentStatus, InstructionKind, LlmOutput, Message,
    Phase, RuntimeContext, RuntimeError, RuntimeResult,
};
use futures::StreamExt;
use std::time::Instant;
use tracing::debug;

use super::{mismatched, record_usage};
use crate::agent::{Agent, UsageOperation};
use crate::cost_limit;
use crate::executor::{ExecutorOutput, InstructionExecutor};

/// Streams a model response and folds it into one `llm_result`.
///
/// The assistant reply is appended to the conversation so later tool
/// messages have a call to answer.
pub struct CallLlmExecutor;

#[async_trait]
impl InstructionExecutor for CallLlmExecutor {
    async fn execute(
        &self,
        instruction: AgentInstruction,
        mut state: AgentState,
        agent: &dyn Agent,
    ) -> RuntimeResult<ExecutorOutput> {
        let payload = match instruction {
            AgentInstruction::CallLlm { payload } => payload,
            other => return Err(mismatched(InstructionKind::CallLlm, &other)),
        };
        let model = agent
            .model_runtime()
            .ok_or(RuntimeError::ModelRuntimeMissing)?;

        state.status = AgentStatus::Running;
        let mut events = vec![AgentEvent::LlmStart {
            payload: payload.clone(),
        }];

        let started = Instant::now();
        let mut stream = model.stream(&payload).await?;
        let mut output = LlmOutput::default();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            output.absorb(&chunk);
            events.push(AgentEvent::LlmStream { chunk });
        }
        let elapsed_ms = started.elapsed().as_millis() as u64;

        debug!(
            session_id = %state.session_id,
            chunks = events.len() - 1,
            elapsed_ms,
            has_tool_calls = output.has_tool_calls(),
            "model stream finished"
        );

        events.push(AgentEvent::LlmResult {
            result: output.clone(),
        });

        let mut reply = Message::assistant(output.content.clone());
        if let Some(tool_calls) = &output.tool_calls {
            reply = reply.with_tool_calls(tool_calls.clone());
        }
        state.messages.push(reply);

        record_usage(
            &mut state,
            agent,
            UsageOperation::Llm {
                payload: &payload,
                output: &output,
                elapsed_ms,
            },
        );

        let next_context = RuntimeContext::new(
            Phase::LlmResult {
                has_tool_calls: output.has_tool_calls(),
                tool_calls: output.tool_calls.clone(),
                result: output,
            },
            &state,
        );

        Ok(cost_limit::enforce(
            ExecutorOutput::new(state, events).with_next_context(next_context),
        ))
    }
}
