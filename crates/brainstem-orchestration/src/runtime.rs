//! The multi-agent loop: supervisor decides, group executors act.

use async_trait::async_trait;
use brainstem_core::{AgentEvent, AgentState, AgentStatus, FinishReason};
use chrono::Utc;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, info_span, warn};

use crate::error::{OrchestrationError, OrchestrationResult};
use crate::supervisor::Supervisor;
use crate::types::{ExecutorResult, SupervisorInstruction, SupervisorInstructionKind};

/// Output of a group executor.
#[derive(Debug, Clone)]
pub struct GroupExecutorOutput {
    pub events: Vec<AgentEvent>,
    pub new_state: AgentState,
    /// Result handed back to the supervisor. `None` ends the run.
    pub result: Option<ExecutorResult>,
}

impl GroupExecutorOutput {
    pub fn new(new_state: AgentState, events: Vec<AgentEvent>) -> Self {
        Self {
            events,
            new_state,
            result: None,
        }
    }

    pub fn with_result(mut self, result: ExecutorResult) -> Self {
        self.result = Some(result);
        self
    }
}

/// Host-supplied handler for one supervisor instruction type.
#[async_trait]
pub trait GroupExecutor: Send + Sync {
    async fn execute(
        &self,
        instruction: SupervisorInstruction,
        state: AgentState,
    ) -> OrchestrationResult<GroupExecutorOutput>;
}

/// Synchronous closure executor, convenient for hosts and tests.
pub struct FnGroupExecutor<F>(F);

impl<F> FnGroupExecutor<F>
where
    F: Fn(SupervisorInstruction, AgentState) -> OrchestrationResult<GroupExecutorOutput>
        + Send
        + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

#[async_trait]
impl<F> GroupExecutor for FnGroupExecutor<F>
where
    F: Fn(SupervisorInstruction, AgentState) -> OrchestrationResult<GroupExecutorOutput>
        + Send
        + Sync,
{
    async fn execute(
        &self,
        instruction: SupervisorInstruction,
        state: AgentState,
    ) -> OrchestrationResult<GroupExecutorOutput> {
        (self.0)(instruction, state)
    }
}

/// Marks the group run done with the supervisor's reason.
#[derive(Debug, Default, Clone, Copy)]
pub struct FinishExecutor;

#[async_trait]
impl GroupExecutor for FinishExecutor {
    async fn execute(
        &self,
        instruction: SupervisorInstruction,
        mut state: AgentState,
    ) -> OrchestrationResult<GroupExecutorOutput> {
        let reason = match instruction {
            SupervisorInstruction::Finish { reason } => reason,
            other => {
                return Err(OrchestrationError::ExecutorFailed {
                    instruction: SupervisorInstructionKind::Finish.to_string(),
                    message: format!("unexpected instruction: {}", other.kind()),
                });
            }
        };

        info!(session_id = %state.session_id, %reason, "group run finished");
        state.status = AgentStatus::Done;
        let event = AgentEvent::done(&state, FinishReason::Completed, Some(reason));
        Ok(GroupExecutorOutput::new(state, vec![event]))
    }
}

/// Executors keyed by supervisor instruction type.
#[derive(Clone, Default)]
pub struct GroupExecutorTable {
    executors: HashMap<SupervisorInstructionKind, Arc<dyn GroupExecutor>>,
}

impl GroupExecutorTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(
        mut self,
        kind: SupervisorInstructionKind,
        executor: impl GroupExecutor + 'static,
    ) -> Self {
        self.insert(kind, Arc::new(executor));
        self
    }

    pub fn insert(&mut self, kind: SupervisorInstructionKind, executor: Arc<dyn GroupExecutor>) {
        self.executors.insert(kind, executor);
    }

    pub fn get(&self, kind: SupervisorInstructionKind) -> Option<Arc<dyn GroupExecutor>> {
        self.executors.get(&kind).cloned()
    }

    pub fn kinds(&self) -> Vec<SupervisorInstructionKind> {
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
}

impl std::fmt::Debug for GroupExecutorTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroupExecutorTable")
            .field("kinds", &self.kinds())
            .finish()
    }
}

/// Host-side handle of a running group operation.
#[derive(Debug, Clone, Default)]
pub struct OperationHandle {
    pub cancellation: CancellationToken,
    pub context: Value,
}

impl OperationHandle {
    pub fn new(context: Value) -> Self {
        Self {
            cancellation: CancellationToken::new(),
            context,
        }
    }
}

/// Resolves an operation id to its handle.
pub trait OperationLookup: Send + Sync {
    fn get_operation(&self, operation_id: &str) -> Option<OperationHandle>;
}

/// Closure-backed [`OperationLookup`].
pub struct FnOperationLookup<F>(F);

impl<F> FnOperationLookup<F>
where
    F: Fn(&str) -> Option<OperationHandle> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> OperationLookup for FnOperationLookup<F>
where
    F: Fn(&str) -> Option<OperationHandle> + Send + Sync,
{
    fn get_operation(&self, operation_id: &str) -> Option<OperationHandle> {
        (self.0)(operation_id)
    }
}

/// In-memory operation table.
#[derive(Debug, Default)]
pub struct OperationRegistry {
    operations: Mutex<HashMap<String, OperationHandle>>,
}

impl OperationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fresh handle and return it.
    pub fn register(&self, operation_id: impl Into<String>, context: Value) -> OperationHandle {
        let handle = OperationHandle::new(context);
        self.operations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(operation_id.into(), handle.clone());
        handle
    }

    /// Cancel an operation. Returns `false` if it is unknown.
    pub fn cancel(&self, operation_id: &str) -> bool {
        match self
            .operations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(operation_id)
        {
            Some(handle) => {
                handle.cancellation.cancel();
                true
            }
            None => false,
        }
    }

    pub fn remove(&self, operation_id: &str) -> Option<OperationHandle> {
        self.operations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(operation_id)
    }
}

impl OperationLookup for OperationRegistry {
    fn get_operation(&self, operation_id: &str) -> Option<OperationHandle> {
        self.operations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(operation_id)
            .cloned()
    }
}

/// Group runtime configuration.
#[derive(Clone, Default)]
pub struct GroupRuntimeConfig {
    pub executors: GroupExecutorTable,
    pub operation_id: Option<String>,
    pub get_operation: Option<Arc<dyn OperationLookup>>,
}

impl GroupRuntimeConfig {
    pub fn new(executors: GroupExecutorTable) -> Self {
        Self {
            executors,
            ..Default::default()
        }
    }

    pub fn with_operation(
        mut self,
        operation_id: impl Into<String>,
        lookup: Arc<dyn OperationLookup>,
    ) -> Self {
        self.operation_id = Some(operation_id.into());
        self.get_operation = Some(lookup);
        self
    }

    pub fn with_operation_id(mut self, operation_id: impl Into<String>) -> Self {
        self.operation_id = Some(operation_id.into());
        self
    }
}

impl std::fmt::Debug for GroupRuntimeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroupRuntimeConfig")
            .field("executors", &self.executors)
            .field("operation_id", &self.operation_id)
            .field("get_operation", &self.get_operation.is_some())
            .finish()
    }
}

/// Outcome of one group step.
#[derive(Debug, Clone)]
pub struct GroupStepResult {
    pub events: Vec<AgentEvent>,
    pub new_state: AgentState,
    pub result: Option<ExecutorResult>,
}

/// Outcome of a full group run.
#[derive(Debug, Clone)]
pub struct GroupRunOutcome {
    pub events: Vec<AgentEvent>,
    pub final_state: AgentState,
    pub steps: u32,
    /// The run stopped because the operation was cancelled.
    pub cancelled: bool,
}

/// Drives a [`Supervisor`] against host-supplied group executors.
pub struct GroupOrchestrationRuntime {
    supervisor: Arc<dyn Supervisor>,
    config: GroupRuntimeConfig,
}

impl GroupOrchestrationRuntime {
    pub fn new(supervisor: Arc<dyn Supervisor>, config: GroupRuntimeConfig) -> Self {
        Self { supervisor, config }
    }

    pub fn create_initial_state(session_id: impl Into<String>) -> AgentState {
        AgentState::new(session_id)
    }

    fn operation(&self) -> Option<OperationHandle> {
        let operation_id = self.config.operation_id.as_deref()?;
        self.config.get_operation.as_ref()?.get_operation(operation_id)
    }

    /// Host context of the current operation.
    pub fn context(&self) -> Option<Value> {
        self.operation().map(|op| op.context)
    }

    /// Cancellation token of the current operation.
    pub fn cancellation_token(&self) -> Option<CancellationToken> {
        self.operation().map(|op| op.cancellation)
    }

    /// Decide and execute one instruction.
    ///
    /// A missing executor for the decided instruction is an error.
    pub async fn step(
        &self,
        state: &AgentState,
        result: &ExecutorResult,
    ) -> OrchestrationResult<GroupStepResult> {
        let mut base = state.clone();
        base.step_count += 1;
        base.last_modified = Utc::now();

        if let Some(max_steps) = base.max_steps
            && base.step_count > max_steps
        {
            warn!(session_id = %base.session_id, max_steps, "maximum group steps exceeded");
            base.status = AgentStatus::Done;
            let event = AgentEvent::done(
                &base,
                FinishReason::MaxStepsExceeded,
                Some(format!("Maximum steps exceeded: {max_steps}")),
            );
            base.events.push(event.clone());
            return Ok(GroupStepResult {
                events: vec![event],
                new_state: base,
                result: None,
            });
        }

        let step_count = base.step_count;
        let last_modified = base.last_modified;

        let instruction = self.supervisor.decide(result, &base).await?;
        let kind = instruction.kind();
        let executor = self
            .config
            .executors
            .get(kind)
            .ok_or_else(|| OrchestrationError::ExecutorNotFound(kind.to_string()))?;

        debug!(session_id = %base.session_id, step = step_count, instruction = %kind, "executing group instruction");

        let output = executor.execute(instruction, base).await?;
        let mut new_state = output.new_state;
        new_state.step_count = step_count;
        new_state.last_modified = last_modified;
        new_state.events.extend(output.events.iter().cloned());

        Ok(GroupStepResult {
            events: output.events,
            new_state,
            result: output.result,
        })
    }

    /// Loop from `init` until an executor returns no result or the
    /// operation is cancelled. Cancellation is checked after each step.
    pub async fn run(
        &self,
        initial_state: AgentState,
        group_id: Option<String>,
    ) -> OrchestrationResult<GroupRunOutcome> {
        let group_id = group_id.unwrap_or_else(|| initial_state.session_id.clone());
        let span = info_span!("group_run", group_id = %group_id);
        self.run_loop(initial_state, group_id).instrument(span).await
    }

    async fn run_loop(
        &self,
        initial_state: AgentState,
        group_id: String,
    ) -> OrchestrationResult<GroupRunOutcome> {
        let cancellation = self.cancellation_token();
        let mut state = initial_state;
        let mut result = Some(ExecutorResult::init(group_id));
        let mut events = Vec::new();
        let mut steps = 0;
        let mut cancelled = false;

        while let Some(current) = result {
            let step = self.step(&state, &current).await?;
            steps += 1;
            events.extend(step.events);
            state = step.new_state;
            result = step.result;

            if let Some(token) = &cancellation
                && token.is_cancelled()
            {
                info!(session_id = %state.session_id, steps, "group run cancelled");
                cancelled = true;
                break;
            }
        }

        info!(session_id = %state.session_id, steps, status = %state.status, "group run ended");
        Ok(GroupRunOutcome {
            events,
            final_state: state,
            steps,
            cancelled,
        })
    }
}

impl std::fmt::Debug for GroupOrchestrationRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroupOrchestrationRuntime")
            .field("config", &self.config)
            .finish()
    }
}
