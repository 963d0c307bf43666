//! # Brainstem
//!
//! Brainstem is an agent execution engine. Decision making ("brains": an
//! [`Agent`] or a [`Supervisor`]) is separated from execution (the
//! [`AgentRuntime`] and [`GroupOrchestrationRuntime`]) by a serializable
//! instruction/event protocol, so model calls, tool calls, human-in-the-loop
//! approval and multi-agent turns can be driven, persisted, resumed and
//! replayed independently of any model provider or UI.
//!
//! ## Core Components
//!
//! - **[Agent]**: plans the next [`Plan`] of instructions from a [`RuntimeContext`]
//! - **[AgentRuntime]**: executes one step at a time against a caller-owned [`AgentState`]
//! - **[UsageCounter]**: pure usage and cost accumulation
//! - **[GroupOrchestrationSupervisor]**: round-counting decision machine for groups
//! - **[GroupOrchestrationRuntime]**: the multi-agent loop over host executors
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use brainstem::{Agent, AgentInstruction, AgentRuntime, AgentState, Message, Plan};
//!
//! let runtime = AgentRuntime::new(Arc::new(MyAgent::default()));
//! let state = AgentState::new_session().with_message(Message::user("hello"));
//! let step = runtime.step(&state, None).await;
//! store.save(&step.new_state)?;
//! ```

// ============================================================================
// Module aliases for namespaced access
// ============================================================================

pub use brainstem_core as core;
pub use brainstem_orchestration as orchestration;
pub use brainstem_runtime as runtime;

#[cfg(feature = "testing")]
pub use brainstem_testing as testing;

// ============================================================================
// Protocol types - state, messages, instructions, events
// ============================================================================

pub use brainstem_core::{
    AgentEvent, AgentInstruction, AgentState, AgentStatus, CostLimit, CostLimitAction,
    FinishReason, InstructionKind, Interruption, Message, MessageRole, ModelChunk, Phase, Plan,
    RuntimeContext, ToolsCalling,
};

// Usage and cost
pub use brainstem_core::{Cost, ModelUsage, Usage, UsageCounter};

// Errors
pub use brainstem_core::{ErrorInfo, RuntimeError, RuntimeResult, ToolError};

// Settings
pub use brainstem_core::{RuntimeSettings, SettingsError};

// ============================================================================
// Single-agent runtime
// ============================================================================

pub use brainstem_runtime::{
    Agent, AgentRuntime, CostCalculator, ExecutorOutput, ExecutorTable, FnModelRuntime, FnTool,
    InstructionExecutor, ModelRuntime, RuntimeConfig, StepResult, ToolHandler, ToolRegistry,
    UsageCalculator,
};

// ============================================================================
// Group orchestration
// ============================================================================

pub use brainstem_orchestration::{
    ExecutorResult, FinishExecutor as GroupFinishExecutor, GroupExecutor, GroupExecutorTable,
    GroupOrchestrationRuntime, GroupOrchestrationSupervisor, GroupRuntimeConfig, OperationHandle,
    OperationRegistry, OrchestrationError, Supervisor, SupervisorConfig, SupervisorInstruction,
    SupervisorInstructionKind,
};
