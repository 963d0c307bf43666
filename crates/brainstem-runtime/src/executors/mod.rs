//! Built-in executors, one per instruction kind.

mod call_llm;
mod call_tool;
mod finish;
mod human;
mod resolve_aborted;

pub use call_llm::CallLlmExecutor;
pub use call_tool::CallToolExecutor;
pub use finish::FinishExecutor;
pub use human::{
    RequestHumanApproveExecutor, RequestHumanPromptExecutor, RequestHumanSelectExecutor,
};
pub use resolve_aborted::{ABORTED_TOOL_MESSAGE, ResolveAbortedToolsExecutor};

use brainstem_core::{AgentInstruction, AgentState, InstructionKind, RuntimeError};

use crate::agent::{Agent, CostContext, UsageOperation};
use crate::executor::ExecutorTable;

impl ExecutorTable {
    /// The seven executors every runtime starts from.
    pub fn builtin() -> Self {
        ExecutorTable::new()
            .with(InstructionKind::CallLlm, CallLlmExecutor)
            .with(InstructionKind::CallTool, CallToolExecutor)
            .with(InstructionKind::RequestHumanApprove, RequestHumanApproveExecutor)
            .with(InstructionKind::RequestHumanPrompt, RequestHumanPromptExecutor)
            .with(InstructionKind::RequestHumanSelect, RequestHumanSelectExecutor)
            .with(InstructionKind::ResolveAbortedTools, ResolveAbortedToolsExecutor)
            .with(InstructionKind::Finish, FinishExecutor)
    }
}

/// Run the agent's usage and cost strategies, if it has any.
pub(crate) fn record_usage(state: &mut AgentState, agent: &dyn Agent, operation: UsageOperation<'_>) {
    if let Some(calculator) = agent.usage_calculator() {
        state.usage = calculator.calculate_usage(&operation, &state.usage);
    }
    if let Some(calculator) = agent.cost_calculator() {
        state.cost = calculator.calculate_cost(&CostContext {
            operation: &operation,
            usage: &state.usage,
            previous_cost: &state.cost,
            cost_limit: state.cost_limit.as_ref(),
        });
    }
}

/// An executor was handed an instruction of another kind.
pub(crate) fn mismatched(expected: InstructionKind, got: &AgentInstruction) -> RuntimeError {
    RuntimeError::Internal(format!(
        "{expected} executor received a {} instruction",
        got.kind()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_covers_every_kind() {
        let table = ExecutorTable::builtin();
        assert_eq!(table.len(), InstructionKind::ALL.len());
        for kind in InstructionKind::ALL {
            assert!(table.get(kind).is_some(), "missing builtin for {kind}");
        }
    }
}
