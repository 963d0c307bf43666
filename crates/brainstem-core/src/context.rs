//! The context handed to an agent when it plans its next instruction.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ErrorInfo;
use crate::message::{Message, ToolsCalling};
use crate::model::LlmOutput;
use crate::state::{AgentState, AgentStatus};

/// What just happened, with the data belonging to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "name",
    content = "payload",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum Phase {
    Init,
    UserInput {
        message: Message,
        is_first_message: bool,
    },
    LlmResult {
        result: LlmOutput,
        has_tool_calls: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tool_calls: Option<Vec<ToolsCalling>>,
    },
    ToolResult {
        result: Value,
        tool_call: ToolsCalling,
        tool_call_id: String,
    },
    HumanResponse {
        response: Value,
    },
    HumanApprovedTool {
        approved_tool_call: ToolsCalling,
    },
    Error {
        error: ErrorInfo,
        #[serde(default)]
        is_cost_warning: bool,
    },
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Init => "init",
            Phase::UserInput { .. } => "user_input",
            Phase::LlmResult { .. } => "llm_result",
            Phase::ToolResult { .. } => "tool_result",
            Phase::HumanResponse { .. } => "human_response",
            Phase::HumanApprovedTool { .. } => "human_approved_tool",
            Phase::Error { .. } => "error",
        }
    }
}

/// Summary of the session at the time a context was built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionContext {
    pub session_id: String,
    pub status: AgentStatus,
    pub step_count: u32,
    pub message_count: usize,
}

impl SessionContext {
    pub fn from_state(state: &AgentState) -> Self {
        Self {
            session_id: state.session_id.clone(),
            status: state.status,
            step_count: state.step_count,
            message_count: state.messages.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeContext {
    pub phase: Phase,
    pub session: SessionContext,
}

impl RuntimeContext {
    pub fn new(phase: Phase, state: &AgentState) -> Self {
        Self {
            phase,
            session: SessionContext::from_state(state),
        }
    }

    /// Context for callers that never built one: `user_input` when the last
    /// message came from the user, `init` otherwise.
    pub fn initial(state: &AgentState) -> Self {
        let phase = match state.last_message() {
            Some(message) if state.last_message_is_from_user() => Phase::UserInput {
                message: message.clone(),
                is_first_message: state.messages.len() == 1,
            },
            _ => Phase::Init,
        };
        Self::new(phase, state)
    }

    pub fn human_response(response: Value, state: &AgentState) -> Self {
        Self::new(Phase::HumanResponse { response }, state)
    }

    pub fn human_approved_tool(tool_call: ToolsCalling, state: &AgentState) -> Self {
        Self::new(
            Phase::HumanApprovedTool {
                approved_tool_call: tool_call,
            },
            state,
        )
    }
}
