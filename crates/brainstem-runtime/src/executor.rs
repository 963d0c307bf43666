//! Instruction executors and their dispatch table.

use async_trait::async_trait;
use brainstem_core::{
    AgentEvent, AgentInstruction, AgentState, InstructionKind, RuntimeContext, RuntimeError,
    RuntimeResult,
};
use std::collections::HashMap;
use std::sync::Arc;

use crate::agent::Agent;

/// What an executor hands back: the events it emitted, the state after the
/// instruction, and optionally the context for the next planning call.
#[derive(Debug, Clone)]
pub struct ExecutorOutput {
    pub events: Vec<AgentEvent>,
    pub new_state: AgentState,
    pub next_context: Option<RuntimeContext>,
}

impl ExecutorOutput {
    pub fn new(new_state: AgentState, events: Vec<AgentEvent>) -> Self {
        Self {
            events,
            new_state,
            next_context: None,
        }
    }

    pub fn with_next_context(mut self, context: RuntimeContext) -> Self {
        self.next_context = Some(context);
        self
    }
}

/// Engine-side handler performing one instruction type.
///
/// Executors receive an owned copy of the state and must not rely on
/// `step_count` or `last_modified` surviving: the runtime re-imposes both.
#[async_trait]
pub trait InstructionExecutor: Send + Sync {
    async fn execute(
        &self,
        instruction: AgentInstruction,
        state: AgentState,
        agent: &dyn Agent,
    ) -> RuntimeResult<ExecutorOutput>;
}

/// Adapter turning a synchronous closure into an executor.
pub struct FnExecutor<F>(F);

impl<F> FnExecutor<F>
where
    F: Fn(AgentInstruction, AgentState) -> RuntimeResult<ExecutorOutput> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

#[async_trait]
impl<F> InstructionExecutor for FnExecutor<F>
where
    F: Fn(AgentInstruction, AgentState) -> RuntimeResult<ExecutorOutput> + Send + Sync,
{
    async fn execute(
        &self,
        instruction: AgentInstruction,
        state: AgentState,
        _agent: &dyn Agent,
    ) -> RuntimeResult<ExecutorOutput> {
        (self.0)(instruction, state)
    }
}

/// Executors keyed by the instruction kind they handle.
#[derive(Clone, Default)]
pub struct ExecutorTable {
    executors: HashMap<InstructionKind, Arc<dyn InstructionExecutor>>,
}

impl ExecutorTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, kind: InstructionKind, executor: impl InstructionExecutor + 'static) -> Self {
        self.executors.insert(kind, Arc::new(executor));
        self
    }

    pub fn insert(&mut self, kind: InstructionKind, executor: Arc<dyn InstructionExecutor>) {
        self.executors.insert(kind, executor);
    }

    pub fn get(&self, kind: InstructionKind) -> Option<&Arc<dyn InstructionExecutor>> {
        self.executors.get(&kind)
    }

    /// Look up the executor for `kind`, failing if none is registered.
    pub fn resolve(&self, kind: InstructionKind) -> RuntimeResult<Arc<dyn InstructionExecutor>> {
        self.executors
            .get(&kind)
            .cloned()
            .ok_or_else(|| RuntimeError::ExecutorNotFound(kind.to_string()))
    }

    /// Registered kinds in a stable order.
    pub fn kinds(&self) -> Vec<InstructionKind> {
        let mut kinds: Vec<_> = self.executors.keys().copied().collect();
        kinds.sort();
        kinds
    }

    pub fn len(&self) -> usize {
        self.executors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.executors.is_empty()
    }

    /// Combine three layers of executors. For each kind the agent's override
    /// wins over the configured one, which wins over the built-in one.
    pub fn merge(
        builtin: &ExecutorTable,
        config: &ExecutorTable,
        agent: &ExecutorTable,
    ) -> ExecutorTable {
        let mut merged = builtin.clone();
        for layer in [config, agent] {
            for (kind, executor) in &layer.executors {
                merged.executors.insert(*kind, Arc::clone(executor));
            }
        }
        merged
    }
}

impl std::fmt::Debug for ExecutorTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutorTable")
            .field("kinds", &self.kinds())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> Arc<dyn InstructionExecutor> {
        Arc::new(FnExecutor::new(|_, state| Ok(ExecutorOutput::new(state, Vec::new()))))
    }

    fn table(kind: InstructionKind, executor: &Arc<dyn InstructionExecutor>) -> ExecutorTable {
        let mut table = ExecutorTable::new();
        table.insert(kind, Arc::clone(executor));
        table
    }

    #[test]
    fn test_merge_priority_agent_over_config_over_builtin() {
        let builtin_exec = noop();
        let config_exec = noop();
        let agent_exec = noop();

        let mut builtin = table(InstructionKind::CallLlm, &builtin_exec);
        builtin.insert(InstructionKind::CallTool, Arc::clone(&builtin_exec));
        builtin.insert(InstructionKind::Finish, Arc::clone(&builtin_exec));

        let mut config = table(InstructionKind::CallLlm, &config_exec);
        config.insert(InstructionKind::CallTool, Arc::clone(&config_exec));
        let agent = table(InstructionKind::CallLlm, &agent_exec);

        let merged = ExecutorTable::merge(&builtin, &config, &agent);

        assert_eq!(merged.len(), 3);
        assert!(Arc::ptr_eq(merged.get(InstructionKind::CallLlm).unwrap(), &agent_exec));
        assert!(Arc::ptr_eq(merged.get(InstructionKind::CallTool).unwrap(), &config_exec));
        assert!(Arc::ptr_eq(merged.get(InstructionKind::Finish).unwrap(), &builtin_exec));
    }

    #[test]
    fn test_resolve_missing_kind() {
        let err = ExecutorTable::new()
            .resolve(InstructionKind::RequestHumanSelect)
            .err()
            .unwrap();
        assert_eq!(
            err.to_string(),
            "No executor found for instruction type: request_human_select"
        );
    }

    #[test]
    fn test_kinds_are_sorted() {
        let exec = noop();
        let mut t = table(InstructionKind::Finish, &exec);
        t.insert(InstructionKind::CallLlm, Arc::clone(&exec));
        assert_eq!(t.kinds(), vec![InstructionKind::CallLlm, InstructionKind::Finish]);
    }
}
