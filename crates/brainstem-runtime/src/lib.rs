//! # Brainstem Runtime
//!
//! The single-agent execution engine. An [`Agent`] plans, the
//! [`AgentRuntime`] executes: each `step` asks the agent for a [`Plan`],
//! dispatches every instruction to its executor and returns the events, the
//! successor state and the context for the next planning call.
//!
//! [`Plan`]: brainstem_core::Plan

pub mod agent;
pub mod cost_limit;
pub mod executor;
pub mod executors;
mod lifecycle;
pub mod runtime;

pub use agent::{
    Agent, CostCalculator, CostContext, FnModelRuntime, FnTool, ModelRuntime, ModelStream,
    ToolHandler, ToolRegistry, UsageCalculator, UsageOperation,
};
pub use cost_limit::{COST_WARNING_CODE, is_cost_limit_exceeded};
pub use executor::{ExecutorOutput, ExecutorTable, FnExecutor, InstructionExecutor};
pub use executors::{
    ABORTED_TOOL_MESSAGE, CallLlmExecutor, CallToolExecutor, FinishExecutor,
    RequestHumanApproveExecutor, RequestHumanPromptExecutor, RequestHumanSelectExecutor,
    ResolveAbortedToolsExecutor,
};
pub use lifecycle::DEFAULT_RESUME_REASON;
pub use runtime::{AgentRuntime, RuntimeConfig, StepResult};
