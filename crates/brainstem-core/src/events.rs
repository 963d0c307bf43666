//! Observable events emitted by executors.
//!
//! Events are the log and wire format of a session. Nothing in the runtime
//! reads them back to decide what happens next.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ErrorInfo;
use crate::message::ToolsCalling;
use crate::model::{LlmOutput, ModelChunk};
use crate::state::{AgentState, SelectOption};

/// Why a session reached `done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Completed,
    UserRequested,
    AgentDecision,
    MaxStepsExceeded,
    CostLimitExceeded,
    UserAborted,
    Timeout,
    ErrorRecovery,
}

impl FinishReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FinishReason::Completed => "completed",
            FinishReason::UserRequested => "user_requested",
            FinishReason::AgentDecision => "agent_decision",
            FinishReason::MaxStepsExceeded => "max_steps_exceeded",
            FinishReason::CostLimitExceeded => "cost_limit_exceeded",
            FinishReason::UserAborted => "user_aborted",
            FinishReason::Timeout => "timeout",
            FinishReason::ErrorRecovery => "error_recovery",
        }
    }
}

impl std::fmt::Display for FinishReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum AgentEvent {
    Init,
    LlmStart {
        payload: Value,
    },
    LlmStream {
        chunk: ModelChunk,
    },
    LlmResult {
        result: LlmOutput,
    },
    ToolPending {
        tool_calls: Vec<ToolsCalling>,
    },
    ToolResult {
        id: String,
        result: Value,
    },
    Done {
        final_state: Box<AgentState>,
        reason: FinishReason,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason_detail: Option<String>,
    },
    Error {
        error: ErrorInfo,
        #[serde(default)]
        is_cost_warning: bool,
    },
    HumanApproveRequired {
        pending_tools_calling: Vec<ToolsCalling>,
        session_id: String,
    },
    HumanPromptRequired {
        prompt: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        metadata: Option<Value>,
        session_id: String,
    },
    HumanSelectRequired {
        prompt: String,
        options: Vec<SelectOption>,
        multi: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        metadata: Option<Value>,
        session_id: String,
    },
    Interrupted {
        reason: String,
        interrupted_at: DateTime<Utc>,
        can_resume: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        metadata: Option<Value>,
    },
    Resumed {
        reason: String,
        resumed_at: DateTime<Utc>,
        resumed_from_step: u32,
    },
}

impl AgentEvent {
    /// A `done` event carrying a snapshot of `state`.
    ///
    /// The snapshot leaves out the event log. The event itself is appended to
    /// that log, so carrying it would nest every earlier `done` inside the next.
    pub fn done(state: &AgentState, reason: FinishReason, reason_detail: Option<String>) -> Self {
        let mut final_state = state.clone();
        final_state.events.clear();
        AgentEvent::Done {
            final_state: Box::new(final_state),
            reason,
            reason_detail,
        }
    }

    pub fn error(error: ErrorInfo) -> Self {
        AgentEvent::Error {
            error,
            is_cost_warning: false,
        }
    }

    /// The wire `type` of this event, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            AgentEvent::Init => "init",
            AgentEvent::LlmStart { .. } => "llm_start",
            AgentEvent::LlmStream { .. } => "llm_stream",
            AgentEvent::LlmResult { .. } => "llm_result",
            AgentEvent::ToolPending { .. } => "tool_pending",
            AgentEvent::ToolResult { .. } => "tool_result",
            AgentEvent::Done { .. } => "done",
            AgentEvent::Error { .. } => "error",
            AgentEvent::HumanApproveRequired { .. } => "human_approve_required",
            AgentEvent::HumanPromptRequired { .. } => "human_prompt_required",
            AgentEvent::HumanSelectRequired { .. } => "human_select_required",
            AgentEvent::Interrupted { .. } => "interrupted",
            AgentEvent::Resumed { .. } => "resumed",
        }
    }
}
