//! # Brainstem Orchestration
//!
//! Multi-agent turns driven by a supervisor. The [`GroupOrchestrationRuntime`]
//! feeds each [`ExecutorResult`] to a [`Supervisor`], dispatches the returned
//! [`SupervisorInstruction`] to a host-supplied [`GroupExecutor`] and loops
//! until an executor reports no further result or the operation is cancelled.
//!
//! ```rust,ignore
//! let supervisor = Arc::new(GroupOrchestrationSupervisor::new(SupervisorConfig::new(5, "lead")));
//! let executors = GroupExecutorTable::new()
//!     .with(SupervisorInstructionKind::CallSupervisor, ask_lead)
//!     .with(SupervisorInstructionKind::CallAgent, call_member)
//!     .with(SupervisorInstructionKind::Finish, FinishExecutor);
//! let runtime = GroupOrchestrationRuntime::new(supervisor, GroupRuntimeConfig::new(executors));
//! let outcome = runtime.run(AgentState::new_session(), Some("group-1".into())).await?;
//! ```

pub mod error;
pub mod runtime;
pub mod supervisor;
pub mod types;

pub use error::{OrchestrationError, OrchestrationResult};
pub use runtime::{
    FinishExecutor, FnGroupExecutor, FnOperationLookup, GroupExecutor, GroupExecutorOutput,
    GroupExecutorTable, GroupOrchestrationRuntime, GroupRunOutcome, GroupRuntimeConfig,
    GroupStepResult, OperationHandle, OperationLookup, OperationRegistry,
};
pub use supervisor::{
    GroupOrchestrationSupervisor, REASON_MAX_ROUNDS_EXCEEDED, REASON_SKIP_CALL_SUPERVISOR,
    REASON_SUPERVISOR_FINISHED, REASON_UNKNOWN_RESULT_TYPE, Supervisor, SupervisorConfig,
};
pub use types::{
    AgentSpoke, AgentsBroadcasted, BroadcastParams, CallSupervisorPayload, DelegateParams,
    Delegated, ExecuteTaskParams, ExecutorResult, FinishParams, InitPayload, SpeakParams,
    SupervisorDecided, SupervisorDecision, SupervisorInstruction, SupervisorInstructionKind,
    TaskCompleted, TasksCompleted,
};
