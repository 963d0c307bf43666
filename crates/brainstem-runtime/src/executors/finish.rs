use async_trait::async_trait;
use brainstem_core::{
    AgentEvent, AgentInstruction, AgentState, AgentStatus, InstructionKind, RuntimeResult,
};
use tracing::info;

use super::mismatched;
use crate::agent::Agent;
use crate::executor::{ExecutorOutput, InstructionExecutor};

/// Ends the session with the reason the agent gave.
pub struct FinishExecutor;

#[async_trait]
impl InstructionExecutor for FinishExecutor {
    async fn execute(
        &self,
        instruction: AgentInstruction,
        mut state: AgentState,
        _agent: &dyn Agent,
    ) -> RuntimeResult<ExecutorOutput> {
        let (reason, reason_detail) = match instruction {
            AgentInstruction::Finish {
                reason,
                reason_detail,
            } => (reason, reason_detail),
            other => return Err(mismatched(InstructionKind::Finish, &other)),
        };

        state.status = AgentStatus::Done;
        info!(session_id = %state.session_id, %reason, "session finished");

        let event = AgentEvent::done(&state, reason, reason_detail);
        Ok(ExecutorOutput::new(state, vec![event]))
    }
}
