use async_trait::async_trait;
use brainstem_core::{
    AgentEvent, AgentInstruction, AgentState, AgentStatus, FinishReason, InstructionKind, Message,
    RuntimeResult,
};
use tracing::info;

use super::mismatched;
use crate::agent::Agent;
use crate::executor::{ExecutorOutput, InstructionExecutor};

pub const ABORTED_TOOL_MESSAGE: &str = "Tool execution was aborted by user.";

const ABORTED_DETAIL: &str = "User aborted operation with pending tool calls";

/// Answers every outstanding tool call with an abort notice and ends the
/// session, so the conversation never holds an unanswered call.
pub struct ResolveAbortedToolsExecutor;

#[async_trait]
impl InstructionExecutor for ResolveAbortedToolsExecutor {
    async fn execute(
        &self,
        instruction: AgentInstruction,
        mut state: AgentState,
        _agent: &dyn Agent,
    ) -> RuntimeResult<ExecutorOutput> {
        let (tools_calling, parent_message_id) = match instruction {
            AgentInstruction::ResolveAbortedTools {
                tools_calling,
                parent_message_id,
            } => (tools_calling, parent_message_id),
            other => return Err(mismatched(InstructionKind::ResolveAbortedTools, &other)),
        };

        for call in &tools_calling {
            state
                .messages
                .push(Message::tool(ABORTED_TOOL_MESSAGE, call.id.clone()));
        }
        state.clear_pending();
        state.status = AgentStatus::Done;

        info!(
            session_id = %state.session_id,
            aborted = tools_calling.len(),
            parent_message_id = parent_message_id.as_deref().unwrap_or("-"),
            "resolved aborted tool calls"
        );

        let event = AgentEvent::done(
            &state,
            FinishReason::UserAborted,
            Some(ABORTED_DETAIL.to_string()),
        );
        Ok(ExecutorOutput::new(state, vec![event]))
    }
}
