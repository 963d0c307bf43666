//! Scripted group executors.

use async_trait::async_trait;
use brainstem_core::AgentState;
use brainstem_orchestration::{
    ExecutorResult, GroupExecutor, GroupExecutorOutput, OrchestrationResult,
    SupervisorInstruction,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

/// Group executor that answers with queued results and records the
/// instructions it received. Clones share the script and the record.
///
/// An exhausted script returns no result, which ends a group run.
#[derive(Debug, Clone, Default)]
pub struct ScriptedGroupExecutor {
    results: Arc<Mutex<VecDeque<ExecutorResult>>>,
    received: Arc<Mutex<Vec<SupervisorInstruction>>>,
}

impl ScriptedGroupExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(self, result: ExecutorResult) -> Self {
        self.results
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(result);
        self
    }

    /// Instructions received so far.
    pub fn received(&self) -> Vec<SupervisorInstruction> {
        self.received
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.received
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[async_trait]
impl GroupExecutor for ScriptedGroupExecutor {
    async fn execute(
        &self,
        instruction: SupervisorInstruction,
        state: AgentState,
    ) -> OrchestrationResult<GroupExecutorOutput> {
        self.received
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(instruction);

        let next = self
            .results
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();

        let output = GroupExecutorOutput::new(state, Vec::new());
        Ok(match next {
            Some(result) => output.with_result(result),
            None => output,
        })
    }
}
