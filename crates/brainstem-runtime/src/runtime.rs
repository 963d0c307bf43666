//! The single-agent step loop.

use brainstem_core::{
    AgentEvent, AgentInstruction, AgentState, AgentStatus, ErrorInfo, FinishReason, Phase, Plan,
    RuntimeContext, RuntimeError, RuntimeResult, RuntimeSettings, ToolsCalling,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{Instrument, debug, debug_span, info, warn};

use crate::agent::Agent;
use crate::executor::ExecutorTable;
use crate::lifecycle::{interrupt_state, resume_state};

/// Runtime configuration.
#[derive(Debug, Clone, Default)]
pub struct RuntimeConfig {
    /// Executors overriding the built-in ones. Agent-supplied overrides still
    /// take precedence over these.
    pub executors: ExecutorTable,
}

impl RuntimeConfig {
    pub fn with_executors(mut self, executors: ExecutorTable) -> Self {
        self.executors = executors;
        self
    }
}

/// Outcome of one runtime call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepResult {
    /// Events emitted by this call, also appended to `new_state.events`.
    pub events: Vec<AgentEvent>,
    pub new_state: AgentState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_context: Option<RuntimeContext>,
}

/// Drives an [`Agent`] one step at a time.
///
/// The runtime keeps no session state of its own: every call borrows the
/// caller's state and returns a successor.
pub struct AgentRuntime {
    agent: Arc<dyn Agent>,
    executors: ExecutorTable,
}

impl AgentRuntime {
    pub fn new(agent: Arc<dyn Agent>) -> Self {
        Self::with_config(agent, RuntimeConfig::default())
    }

    pub fn with_config(agent: Arc<dyn Agent>, config: RuntimeConfig) -> Self {
        let executors =
            ExecutorTable::merge(&ExecutorTable::builtin(), &config.executors, &agent.executors());
        Self { agent, executors }
    }

    /// The effective executor table after merging overrides.
    pub fn executors(&self) -> &ExecutorTable {
        &self.executors
    }

    pub fn create_initial_state(session_id: impl Into<String>) -> AgentState {
        AgentState::new(session_id)
    }

    /// A fresh state with the session-level settings applied.
    pub fn create_initial_state_with(
        session_id: impl Into<String>,
        settings: &RuntimeSettings,
    ) -> AgentState {
        settings.apply(AgentState::new(session_id))
    }

    /// Plan and execute one step.
    ///
    /// Never fails: planning and execution errors become a single `error`
    /// event on a copy of the input state. `step_count` always advances by one.
    pub async fn step(&self, state: &AgentState, context: Option<RuntimeContext>) -> StepResult {
        let span = debug_span!("agent_step", session_id = %state.session_id);
        self.step_inner(state, context).instrument(span).await
    }

    async fn step_inner(&self, state: &AgentState, context: Option<RuntimeContext>) -> StepResult {
        let mut base = state.clone();
        base.step_count += 1;
        base.last_modified = Utc::now();

        debug!(
            session_id = %base.session_id,
            step = base.step_count,
            phase = context.as_ref().map(|c| c.phase.name()).unwrap_or("auto"),
            "agent step"
        );

        if let Some(max_steps) = base.max_steps
            && base.step_count > max_steps
        {
            warn!(session_id = %base.session_id, max_steps, "maximum steps exceeded");
            base.status = AgentStatus::Done;
            let event = AgentEvent::done(
                &base,
                FinishReason::MaxStepsExceeded,
                Some(format!("Maximum steps exceeded: {max_steps}")),
            );
            base.events.push(event.clone());
            return StepResult {
                events: vec![event],
                new_state: base,
                next_context: None,
            };
        }

        let step_count = base.step_count;
        let last_modified = base.last_modified;

        match self.execute_plan(base, context).await {
            Ok(mut result) => {
                result.new_state.step_count = step_count;
                result.new_state.last_modified = last_modified;
                result.new_state.events.extend(result.events.iter().cloned());
                result
            }
            Err(err) => Self::error_result(state, &err),
        }
    }

    /// Execute a human-approved tool call without asking the agent again.
    pub async fn approve_tool_call(&self, state: &AgentState, tool_call: ToolsCalling) -> StepResult {
        let context = RuntimeContext::human_approved_tool(tool_call, state);
        self.step(state, Some(context)).await
    }

    /// Interrupt the session. Does not go through the executor table.
    pub fn interrupt(
        &self,
        state: &AgentState,
        reason: impl Into<String>,
        can_resume: bool,
        metadata: Option<Value>,
    ) -> StepResult {
        let (mut new_state, event) = interrupt_state(state.clone(), reason, can_resume, metadata);
        info!(session_id = %new_state.session_id, can_resume, "session interrupted");
        new_state.events.push(event.clone());
        StepResult {
            events: vec![event],
            new_state,
            next_context: None,
        }
    }

    /// Resume an interrupted session.
    ///
    /// Unlike [`step`](Self::step) this returns `Err` when the state is not
    /// interrupted or the interruption cannot be resumed. With a context the
    /// resumed session immediately runs one step; without one the initial
    /// context is handed back for the caller's next step.
    pub async fn resume(
        &self,
        state: &AgentState,
        reason: Option<String>,
        context: Option<RuntimeContext>,
    ) -> RuntimeResult<StepResult> {
        let (mut resumed, event) = resume_state(state, reason)?;
        resumed.events.push(event.clone());
        info!(session_id = %resumed.session_id, step = resumed.step_count, "session resumed");

        match context {
            Some(context) => {
                let mut result = self.step(&resumed, Some(context)).await;
                result.events.insert(0, event);
                Ok(result)
            }
            None => {
                let next_context = RuntimeContext::initial(&resumed);
                Ok(StepResult {
                    events: vec![event],
                    new_state: resumed,
                    next_context: Some(next_context),
                })
            }
        }
    }

    async fn execute_plan(
        &self,
        state: AgentState,
        context: Option<RuntimeContext>,
    ) -> RuntimeResult<StepResult> {
        let context = context.unwrap_or_else(|| RuntimeContext::initial(&state));

        let plan = match &context.phase {
            Phase::HumanApprovedTool { approved_tool_call } => {
                Plan::from(AgentInstruction::call_tool(approved_tool_call.clone()))
            }
            _ => self
                .agent
                .runner(&context, &state)
                .await
                .map_err(|err| match err {
                    RuntimeError::PlanningFailed(_) => err,
                    other => RuntimeError::PlanningFailed(other.to_string()),
                })?,
        };

        let mut current = state;
        let mut events = Vec::new();
        let mut next_context = None;

        for instruction in plan {
            let kind = instruction.kind();
            let executor = self.executors.resolve(kind)?;
            debug!(session_id = %current.session_id, instruction = %kind, "executing instruction");

            let output = executor
                .execute(instruction, current, self.agent.as_ref())
                .await?;
            events.extend(output.events);
            current = output.new_state;
            if output.next_context.is_some() {
                next_context = output.next_context;
            }

            if matches!(
                current.status,
                AgentStatus::WaitingForHumanInput | AgentStatus::Interrupted | AgentStatus::Done
            ) {
                break;
            }
        }

        Ok(StepResult {
            events,
            new_state: current,
            next_context,
        })
    }

    fn error_result(state: &AgentState, err: &RuntimeError) -> StepResult {
        warn!(
            session_id = %state.session_id,
            code = err.error_code(),
            error = %err,
            "agent step failed"
        );

        let info = ErrorInfo::from(err);
        let mut new_state = state.clone();
        new_state.step_count += 1;
        new_state.last_modified = Utc::now();
        new_state.status = AgentStatus::Error;
        new_state.error = Some(info.clone());

        let event = AgentEvent::error(info);
        new_state.events.push(event.clone());
        StepResult {
            events: vec![event],
            new_state,
            next_context: None,
        }
    }
}

impl std::fmt::Debug for AgentRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentRuntime")
            .field("executors", &self.executors)
            .finish()
    }
}
