//! The persisted state of one agent conversation.
//!
//! An [`AgentState`] is plain data: the caller owns it between steps, can
//! snapshot it anywhere and hand it back later. The runtime only ever reads a
//! borrowed state and returns a new one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ErrorInfo;
use crate::events::AgentEvent;
use crate::message::{Message, MessageRole, ToolsCalling};
use crate::usage::{Cost, DEFAULT_CURRENCY, Usage};

/// Lifecycle status of an agent session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    #[default]
    Idle,
    Running,
    WaitingForHumanInput,
    Done,
    Error,
    Interrupted,
}

impl AgentStatus {
    /// `done` and `error` end a state lineage.
    pub fn is_terminal(&self) -> bool {
        matches!(self, AgentStatus::Done | AgentStatus::Error)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentStatus::Idle => "idle",
            AgentStatus::Running => "running",
            AgentStatus::WaitingForHumanInput => "waiting_for_human_input",
            AgentStatus::Done => "done",
            AgentStatus::Error => "error",
            AgentStatus::Interrupted => "interrupted",
        }
    }
}

impl std::fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to do once the session's cost crosses its limit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostLimitAction {
    /// Finish the session with `cost_limit_exceeded`.
    Stop,
    /// Interrupt the session; it may be resumed.
    Interrupt,
    /// Emit a non-fatal warning and keep going.
    #[default]
    Warn,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostLimit {
    pub max_total_cost: f64,
    pub currency: String,
    #[serde(default)]
    pub on_exceeded: CostLimitAction,
}

impl CostLimit {
    pub fn new(max_total_cost: f64) -> Self {
        Self {
            max_total_cost,
            currency: DEFAULT_CURRENCY.to_string(),
            on_exceeded: CostLimitAction::default(),
        }
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    pub fn with_action(mut self, action: CostLimitAction) -> Self {
        self.on_exceeded = action;
        self
    }
}

/// Record of why and when a session was interrupted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interruption {
    pub reason: String,
    pub interrupted_at: DateTime<Utc>,
    pub can_resume: bool,
}

/// A free-form question waiting for a human answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingHumanPrompt {
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
}

impl SelectOption {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// A multiple-choice question waiting for a human answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingHumanSelect {
    pub prompt: String,
    pub options: Vec<SelectOption>,
    #[serde(default)]
    pub multi: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

/// The "passport" of one conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentState {
    pub session_id: String,
    pub status: AgentStatus,
    #[serde(default)]
    pub messages: Vec<Message>,
    pub step_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_steps: Option<u32>,
    #[serde(default)]
    pub usage: Usage,
    #[serde(default)]
    pub cost: Cost,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_limit: Option<CostLimit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_tools_calling: Option<Vec<ToolsCalling>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_human_prompt: Option<PendingHumanPrompt>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_human_select: Option<PendingHumanSelect>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interruption: Option<Interruption>,
    #[serde(default)]
    pub events: Vec<AgentEvent>,
    pub created_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl AgentState {
    /// A fresh idle state with zeroed usage and cost.
    pub fn new(session_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            session_id: session_id.into(),
            status: AgentStatus::Idle,
            messages: Vec::new(),
            step_count: 0,
            max_steps: None,
            usage: Usage::default(),
            cost: Cost::default(),
            cost_limit: None,
            pending_tools_calling: None,
            pending_human_prompt: None,
            pending_human_select: None,
            interruption: None,
            events: Vec::new(),
            created_at: now,
            last_modified: now,
            error: None,
            metadata: None,
        }
    }

    /// A fresh idle state with a random session id.
    pub fn new_session() -> Self {
        Self::new(uuid::Uuid::new_v4().to_string())
    }

    pub fn with_max_steps(mut self, max_steps: u32) -> Self {
        self.max_steps = Some(max_steps);
        self
    }

    pub fn with_cost_limit(mut self, cost_limit: CostLimit) -> Self {
        self.cost_limit = Some(cost_limit);
        self
    }

    pub fn with_messages(mut self, messages: Vec<Message>) -> Self {
        self.messages = messages;
        self
    }

    pub fn with_message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    pub fn with_step_count(mut self, step_count: u32) -> Self {
        self.step_count = step_count;
        self
    }

    pub fn with_status(mut self, status: AgentStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// True when the most recent message was written by the user.
    pub fn last_message_is_from_user(&self) -> bool {
        self.last_message()
            .is_some_and(|m| m.role == MessageRole::User)
    }

    /// Clear every pending human request.
    pub fn clear_pending(&mut self) {
        self.pending_tools_calling = None;
        self.pending_human_prompt = None;
        self.pending_human_select = None;
    }

    /// Whether any human request is outstanding.
    pub fn has_pending_request(&self) -> bool {
        self.pending_tools_calling.is_some()
            || self.pending_human_prompt.is_some()
            || self.pending_human_select.is_some()
    }
}
