//! Supervisor decision making for group orchestration.

use async_trait::async_trait;
use brainstem_core::{AgentState, OrchestrationSettings};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, info};

use crate::error::OrchestrationResult;
use crate::types::{
    CallSupervisorPayload, ExecutorResult, SupervisorDecided, SupervisorDecision,
    SupervisorInstruction,
};

pub const REASON_SKIP_CALL_SUPERVISOR: &str = "skip_call_supervisor";
pub const REASON_MAX_ROUNDS_EXCEEDED: &str = "max_rounds_exceeded";
pub const REASON_UNKNOWN_RESULT_TYPE: &str = "unknown_result_type";
pub const REASON_SUPERVISOR_FINISHED: &str = "supervisor_finished";

/// Decides the next group instruction from the last executor result.
#[async_trait]
pub trait Supervisor: Send + Sync {
    async fn decide(
        &self,
        result: &ExecutorResult,
        state: &AgentState,
    ) -> OrchestrationResult<SupervisorInstruction>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupervisorConfig {
    /// Completion rounds allowed before the run is finished.
    pub max_rounds: u32,
    pub supervisor_agent_id: String,
}

impl SupervisorConfig {
    pub fn new(max_rounds: u32, supervisor_agent_id: impl Into<String>) -> Self {
        Self {
            max_rounds,
            supervisor_agent_id: supervisor_agent_id.into(),
        }
    }
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        OrchestrationSettings::default().into()
    }
}

impl From<OrchestrationSettings> for SupervisorConfig {
    fn from(settings: OrchestrationSettings) -> Self {
        Self::new(settings.max_rounds, settings.supervisor_agent_id)
    }
}

/// Round-counting supervisor state machine.
///
/// Every result maps to exactly one instruction. `init` resets the round
/// counter, `supervisor_decided` records whether the next completion should
/// skip the supervisor, and completion results either call the supervisor
/// again or finish once `max_rounds` is reached.
#[derive(Debug)]
pub struct GroupOrchestrationSupervisor {
    config: SupervisorConfig,
    round: AtomicU32,
    skip_call_supervisor: AtomicBool,
    group_id: Mutex<String>,
}

impl GroupOrchestrationSupervisor {
    pub fn new(config: SupervisorConfig) -> Self {
        Self {
            config,
            round: AtomicU32::new(0),
            skip_call_supervisor: AtomicBool::new(false),
            group_id: Mutex::new(String::new()),
        }
    }

    pub fn config(&self) -> &SupervisorConfig {
        &self.config
    }

    /// Completed rounds since the last `init`.
    pub fn round(&self) -> u32 {
        self.round.load(Ordering::SeqCst)
    }

    fn group_id(&self) -> String {
        self.group_id
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn call_supervisor(&self, round: u32) -> SupervisorInstruction {
        SupervisorInstruction::CallSupervisor {
            payload: CallSupervisorPayload {
                group_id: self.group_id(),
                round,
                supervisor_agent_id: self.config.supervisor_agent_id.clone(),
            },
        }
    }

    fn on_decided(&self, decided: &SupervisorDecided) -> SupervisorInstruction {
        self.skip_call_supervisor
            .store(decided.skip_call_supervisor, Ordering::SeqCst);

        match &decided.decision {
            SupervisorDecision::Speak(params) => SupervisorInstruction::CallAgent {
                payload: params.clone(),
            },
            SupervisorDecision::Broadcast(params) => SupervisorInstruction::ParallelCallAgents {
                payload: params.clone(),
            },
            SupervisorDecision::Delegate(params) => SupervisorInstruction::Delegate {
                payload: params.clone(),
            },
            SupervisorDecision::ExecuteTask(params) => SupervisorInstruction::ExecAsyncTask {
                payload: params.clone(),
            },
            SupervisorDecision::Finish(params) => SupervisorInstruction::finish(
                params
                    .reason
                    .clone()
                    .unwrap_or_else(|| REASON_SUPERVISOR_FINISHED.to_string()),
            ),
            SupervisorDecision::Unknown { decision, .. } => {
                SupervisorInstruction::finish(format!("unknown_decision: {decision}"))
            }
        }
    }

    fn on_completed(&self) -> SupervisorInstruction {
        if self.skip_call_supervisor.load(Ordering::SeqCst) {
            return SupervisorInstruction::finish(REASON_SKIP_CALL_SUPERVISOR);
        }

        let round = self.round.fetch_add(1, Ordering::SeqCst) + 1;
        if round >= self.config.max_rounds {
            info!(round, max_rounds = self.config.max_rounds, "maximum rounds reached");
            return SupervisorInstruction::finish(REASON_MAX_ROUNDS_EXCEEDED);
        }
        self.call_supervisor(round)
    }

    /// The state machine itself; [`Supervisor::decide`] delegates here.
    pub fn next_instruction(&self, result: &ExecutorResult) -> SupervisorInstruction {
        let instruction = match result {
            ExecutorResult::Init(payload) => {
                self.round.store(0, Ordering::SeqCst);
                self.skip_call_supervisor.store(false, Ordering::SeqCst);
                *self.group_id.lock().unwrap_or_else(PoisonError::into_inner) =
                    payload.group_id.clone();
                self.call_supervisor(0)
            }
            ExecutorResult::SupervisorDecided(decided) => self.on_decided(decided),
            ExecutorResult::AgentSpoke(_)
            | ExecutorResult::AgentsBroadcasted(_)
            | ExecutorResult::TaskCompleted(_)
            | ExecutorResult::TasksCompleted(_) => self.on_completed(),
            ExecutorResult::Delegated(delegated) => {
                SupervisorInstruction::finish(format!("delegated_to_{}", delegated.agent_id))
            }
            ExecutorResult::Unknown { .. } => SupervisorInstruction::finish(REASON_UNKNOWN_RESULT_TYPE),
        };

        debug!(
            result = result.result_type(),
            instruction = %instruction.kind(),
            round = self.round(),
            "supervisor decided"
        );
        instruction
    }
}

impl Default for GroupOrchestrationSupervisor {
    fn default() -> Self {
        Self::new(SupervisorConfig::default())
    }
}

#[async_trait]
impl Supervisor for GroupOrchestrationSupervisor {
    async fn decide(
        &self,
        result: &ExecutorResult,
        _state: &AgentState,
    ) -> OrchestrationResult<SupervisorInstruction> {
        Ok(self.next_instruction(result))
    }
}
