//! # Brainstem Core
//!
//! State and protocol types shared by the agent runtime and the group
//! orchestration runtime: the persisted [`AgentState`], the instruction and
//! event vocabularies, the planning [`RuntimeContext`], and the pure
//! [`UsageCounter`] accumulators.

pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod instruction;
pub mod message;
pub mod model;
pub mod state;
pub mod usage;
pub mod usage_counter;

pub use config::{CostLimitSettings, OrchestrationSettings, RuntimeSettings, SettingsError};
pub use context::{Phase, RuntimeContext, SessionContext};
pub use error::{ErrorInfo, RuntimeError, RuntimeResult, ToolError};
pub use events::{AgentEvent, FinishReason};
pub use instruction::{AgentInstruction, InstructionKind, Plan};
pub use message::{Message, MessageRole, ToolCallKind, ToolFunction, ToolsCalling};
pub use model::{LlmOutput, ModelChunk};
pub use state::{
    AgentState, AgentStatus, CostLimit, CostLimitAction, Interruption, PendingHumanPrompt,
    PendingHumanSelect, SelectOption,
};
pub use usage::{
    Cost, HumanInteractionUsage, LlmCost, LlmUsage, ModelCostEntry, ModelUsage, TokenUsage,
    ToolCostEntry, ToolUsageEntry, ToolsCost, ToolsUsage, Usage,
};
pub use usage_counter::{Accumulated, LlmAccumulation, ToolAccumulation, UsageCounter};
