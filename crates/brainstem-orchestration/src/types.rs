//! Group orchestration protocol: executor results flowing to the supervisor
//! and supervisor instructions flowing to group executors.
//!
//! Results use a `{type, payload}` envelope. Result types and supervisor
//! decisions this crate does not know are kept as data instead of failing
//! to parse, so the supervisor can answer them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Executor results
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitPayload {
    pub group_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeakParams {
    pub agent_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instruction: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastParams {
    pub agent_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instruction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_message_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelegateParams {
    pub agent_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteTaskParams {
    pub agent_id: String,
    pub task: String,
    /// Timeout in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_message_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinishParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// What the supervising agent decided to do next.
#[derive(Debug, Clone, PartialEq)]
pub enum SupervisorDecision {
    Speak(SpeakParams),
    Broadcast(BroadcastParams),
    Delegate(DelegateParams),
    ExecuteTask(ExecuteTaskParams),
    Finish(FinishParams),
    /// A decision name this crate does not know.
    Unknown { decision: String, params: Value },
}

impl SupervisorDecision {
    pub fn name(&self) -> &str {
        match self {
            SupervisorDecision::Speak(_) => "speak",
            SupervisorDecision::Broadcast(_) => "broadcast",
            SupervisorDecision::Delegate(_) => "delegate",
            SupervisorDecision::ExecuteTask(_) => "execute_task",
            SupervisorDecision::Finish(_) => "finish",
            SupervisorDecision::Unknown { decision, .. } => decision,
        }
    }
}

/// Payload of a `supervisor_decided` result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDecision", into = "RawDecision")]
pub struct SupervisorDecided {
    pub decision: SupervisorDecision,
    /// Skip the supervisor round that would follow the next completion.
    pub skip_call_supervisor: bool,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDecision {
    decision: String,
    #[serde(default)]
    params: Value,
    #[serde(default)]
    skip_call_supervisor: bool,
}

impl TryFrom<RawDecision> for SupervisorDecided {
    type Error = serde_json::Error;

    fn try_from(raw: RawDecision) -> Result<Self, Self::Error> {
        let params = raw.params;
        let decision = match raw.decision.as_str() {
            "speak" => SupervisorDecision::Speak(serde_json::from_value(params)?),
            "broadcast" => SupervisorDecision::Broadcast(serde_json::from_value(params)?),
            "delegate" => SupervisorDecision::Delegate(serde_json::from_value(params)?),
            "execute_task" => SupervisorDecision::ExecuteTask(serde_json::from_value(params)?),
            "finish" if params.is_null() => SupervisorDecision::Finish(FinishParams::default()),
            "finish" => SupervisorDecision::Finish(serde_json::from_value(params)?),
            _ => SupervisorDecision::Unknown {
                decision: raw.decision,
                params,
            },
        };
        Ok(SupervisorDecided {
            decision,
            skip_call_supervisor: raw.skip_call_supervisor,
        })
    }
}

impl From<SupervisorDecided> for RawDecision {
    fn from(decided: SupervisorDecided) -> Self {
        let decision = decided.decision.name().to_string();
        let params = match decided.decision {
            SupervisorDecision::Speak(p) => to_value(p),
            SupervisorDecision::Broadcast(p) => to_value(p),
            SupervisorDecision::Delegate(p) => to_value(p),
            SupervisorDecision::ExecuteTask(p) => to_value(p),
            SupervisorDecision::Finish(p) => to_value(p),
            SupervisorDecision::Unknown { params, .. } => params,
        };
        RawDecision {
            decision,
            params,
            skip_call_supervisor: decided.skip_call_supervisor,
        }
    }
}

fn to_value<T: Serialize>(value: T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentSpoke {
    pub agent_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentsBroadcasted {
    pub agent_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Delegated {
    pub agent_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskCompleted {
    pub agent_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TasksCompleted {
    #[serde(default)]
    pub agent_ids: Vec<String>,
}

/// Output handed back to the supervisor after an instruction executed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawExecutorResult", into = "RawExecutorResult")]
pub enum ExecutorResult {
    Init(InitPayload),
    SupervisorDecided(SupervisorDecided),
    AgentSpoke(AgentSpoke),
    AgentsBroadcasted(AgentsBroadcasted),
    Delegated(Delegated),
    TaskCompleted(TaskCompleted),
    TasksCompleted(TasksCompleted),
    /// A result type this crate does not know.
    Unknown { result_type: String, payload: Value },
}

#[derive(Serialize, Deserialize)]
struct RawExecutorResult {
    #[serde(rename = "type")]
    result_type: String,
    #[serde(default)]
    payload: Value,
}

impl ExecutorResult {
    pub fn init(group_id: impl Into<String>) -> Self {
        ExecutorResult::Init(InitPayload {
            group_id: group_id.into(),
        })
    }

    pub fn supervisor_decided(decision: SupervisorDecision, skip_call_supervisor: bool) -> Self {
        ExecutorResult::SupervisorDecided(SupervisorDecided {
            decision,
            skip_call_supervisor,
        })
    }

    pub fn agent_spoke(agent_id: impl Into<String>) -> Self {
        ExecutorResult::AgentSpoke(AgentSpoke {
            agent_id: agent_id.into(),
            content: None,
        })
    }

    /// The wire `type` of this result.
    pub fn result_type(&self) -> &str {
        match self {
            ExecutorResult::Init(_) => "init",
            ExecutorResult::SupervisorDecided(_) => "supervisor_decided",
            ExecutorResult::AgentSpoke(_) => "agent_spoke",
            ExecutorResult::AgentsBroadcasted(_) => "agents_broadcasted",
            ExecutorResult::Delegated(_) => "delegated",
            ExecutorResult::TaskCompleted(_) => "task_completed",
            ExecutorResult::TasksCompleted(_) => "tasks_completed",
            ExecutorResult::Unknown { result_type, .. } => result_type,
        }
    }
}

impl TryFrom<RawExecutorResult> for ExecutorResult {
    type Error = serde_json::Error;

    fn try_from(raw: RawExecutorResult) -> Result<Self, Self::Error> {
        let payload = raw.payload;
        Ok(match raw.result_type.as_str() {
            "init" => ExecutorResult::Init(serde_json::from_value(payload)?),
            "supervisor_decided" => ExecutorResult::SupervisorDecided(serde_json::from_value(payload)?),
            "agent_spoke" => ExecutorResult::AgentSpoke(serde_json::from_value(payload)?),
            "agents_broadcasted" => ExecutorResult::AgentsBroadcasted(serde_json::from_value(payload)?),
            "delegated" => ExecutorResult::Delegated(serde_json::from_value(payload)?),
            "task_completed" => ExecutorResult::TaskCompleted(serde_json::from_value(payload)?),
            "tasks_completed" => ExecutorResult::TasksCompleted(serde_json::from_value(payload)?),
            _ => ExecutorResult::Unknown {
                result_type: raw.result_type,
                payload,
            },
        })
    }
}

impl From<ExecutorResult> for RawExecutorResult {
    fn from(result: ExecutorResult) -> Self {
        let result_type = result.result_type().to_string();
        let payload = match result {
            ExecutorResult::Init(p) => to_value(p),
            ExecutorResult::SupervisorDecided(p) => to_value(p),
            ExecutorResult::AgentSpoke(p) => to_value(p),
            ExecutorResult::AgentsBroadcasted(p) => to_value(p),
            ExecutorResult::Delegated(p) => to_value(p),
            ExecutorResult::TaskCompleted(p) => to_value(p),
            ExecutorResult::TasksCompleted(p) => to_value(p),
            ExecutorResult::Unknown { payload, .. } => payload,
        };
        RawExecutorResult {
            result_type,
            payload,
        }
    }
}

// ============================================================================
// Supervisor instructions
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallSupervisorPayload {
    pub group_id: String,
    pub round: u32,
    pub supervisor_agent_id: String,
}

/// Instruction produced by a supervisor for a group executor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SupervisorInstruction {
    CallSupervisor { payload: CallSupervisorPayload },
    CallAgent { payload: SpeakParams },
    ParallelCallAgents { payload: BroadcastParams },
    Delegate { payload: DelegateParams },
    ExecAsyncTask { payload: ExecuteTaskParams },
    Finish { reason: String },
}

impl SupervisorInstruction {
    pub fn finish(reason: impl Into<String>) -> Self {
        SupervisorInstruction::Finish {
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> SupervisorInstructionKind {
        match self {
            SupervisorInstruction::CallSupervisor { .. } => SupervisorInstructionKind::CallSupervisor,
            SupervisorInstruction::CallAgent { .. } => SupervisorInstructionKind::CallAgent,
            SupervisorInstruction::ParallelCallAgents { .. } => {
                SupervisorInstructionKind::ParallelCallAgents
            }
            SupervisorInstruction::Delegate { .. } => SupervisorInstructionKind::Delegate,
            SupervisorInstruction::ExecAsyncTask { .. } => SupervisorInstructionKind::ExecAsyncTask,
            SupervisorInstruction::Finish { .. } => SupervisorInstructionKind::Finish,
        }
    }
}

/// Fieldless discriminant of [`SupervisorInstruction`], used as executor key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupervisorInstructionKind {
    CallSupervisor,
    CallAgent,
    ParallelCallAgents,
    Delegate,
    ExecAsyncTask,
    Finish,
}

impl SupervisorInstructionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SupervisorInstructionKind::CallSupervisor => "call_supervisor",
            SupervisorInstructionKind::CallAgent => "call_agent",
            SupervisorInstructionKind::ParallelCallAgents => "parallel_call_agents",
            SupervisorInstructionKind::Delegate => "delegate",
            SupervisorInstructionKind::ExecAsyncTask => "exec_async_task",
            SupervisorInstructionKind::Finish => "finish",
        }
    }
}

impl std::fmt::Display for SupervisorInstructionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
