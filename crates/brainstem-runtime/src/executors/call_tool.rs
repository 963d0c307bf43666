use async_trait::async_trait;
use brainstem_core::{
    AgentEvent, AgentInstruction, AgentState, AgentStatus, InstructionKind, Message, Phase,
    RuntimeContext, RuntimeError, RuntimeResult, ToolsCalling,
};
use serde_json::Value;
use std::time::Instant;
use tracing::debug;

use super::{mismatched, record_usage};
use crate::agent::{Agent, UsageOperation};
use crate::cost_limit;
use crate::executor::{ExecutorOutput, InstructionExecutor};

/// Runs one tool call and records its JSON-encoded result as a tool message.
pub struct CallToolExecutor;

fn decode_arguments(tool_call: &ToolsCalling) -> RuntimeResult<Value> {
    serde_json::from_str(&tool_call.function.arguments).map_err(|e| RuntimeError::InvalidToolArguments {
        tool: tool_call.name().to_string(),
        message: e.to_string(),
    })
}

/// Drop the executed call from the pending list. Remaining calls keep the
/// session waiting for approval.
fn settle_pending(state: &mut AgentState, tool_call_id: &str) {
    let remaining: Vec<ToolsCalling> = state
        .pending_tools_calling
        .take()
        .unwrap_or_default()
        .into_iter()
        .filter(|call| call.id != tool_call_id)
        .collect();

    if remaining.is_empty() {
        state.status = AgentStatus::Running;
    } else {
        state.pending_tools_calling = Some(remaining);
        state.status = AgentStatus::WaitingForHumanInput;
    }
}

#[async_trait]
impl InstructionExecutor for CallToolExecutor {
    async fn execute(
        &self,
        instruction: AgentInstruction,
        mut state: AgentState,
        agent: &dyn Agent,
    ) -> RuntimeResult<ExecutorOutput> {
        let tool_call = match instruction {
            AgentInstruction::CallTool { payload } => payload,
            other => return Err(mismatched(InstructionKind::CallTool, &other)),
        };

        let name = tool_call.name().to_string();
        let handler = agent
            .tools()
            .and_then(|tools| tools.get(&name))
            .ok_or_else(|| RuntimeError::ToolNotFound(name.clone()))?;
        let args = decode_arguments(&tool_call)?;

        let started = Instant::now();
        let result = handler
            .call(args)
            .await
            .map_err(|e| RuntimeError::ToolFailed {
                tool: name.clone(),
                message: e.to_string(),
            })?;
        let execution_time_ms = started.elapsed().as_millis() as u64;

        debug!(
            session_id = %state.session_id,
            tool = %name,
            tool_call_id = %tool_call.id,
            execution_time_ms,
            "tool call finished"
        );

        settle_pending(&mut state, &tool_call.id);
        state
            .messages
            .push(Message::tool(serde_json::to_string(&result)?, tool_call.id.clone()));

        let events = vec![AgentEvent::ToolResult {
            id: tool_call.id.clone(),
            result: result.clone(),
        }];

        record_usage(
            &mut state,
            agent,
            UsageOperation::Tool {
                tool_call: &tool_call,
                result: &result,
                execution_time_ms,
            },
        );

        let next_context = RuntimeContext::new(
            Phase::ToolResult {
                result,
                tool_call_id: tool_call.id.clone(),
                tool_call,
            },
            &state,
        );

        Ok(cost_limit::enforce(
            ExecutorOutput::new(state, events).with_next_context(next_context),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_arguments() {
        let call = ToolsCalling::new("c", "calc", r#"{"a":1}"#);
        assert_eq!(decode_arguments(&call).unwrap(), json!({ "a": 1 }));

        let blank = ToolsCalling::new("c", "calc", "  ");
        assert!(matches!(
            decode_arguments(&blank),
            Err(RuntimeError::InvalidToolArguments { .. })
        ));

        let broken = ToolsCalling::new("c", "calc", "{nope");
        assert!(matches!(
            decode_arguments(&broken),
            Err(RuntimeError::InvalidToolArguments { .. })
        ));
    }

    #[test]
    fn test_settle_pending_keeps_other_calls_waiting() {
        let mut state = AgentState::new("s").with_status(AgentStatus::WaitingForHumanInput);
        state.pending_tools_calling = Some(vec![
            ToolsCalling::new("a", "x", "{}"),
            ToolsCalling::new("b", "y", "{}"),
        ]);

        settle_pending(&mut state, "a");
        assert_eq!(state.status, AgentStatus::WaitingForHumanInput);
        assert_eq!(state.pending_tools_calling.as_ref().unwrap().len(), 1);

        settle_pending(&mut state, "b");
        assert_eq!(state.status, AgentStatus::Running);
        assert!(state.pending_tools_calling.is_none());
    }
}
