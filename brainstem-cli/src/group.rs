use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use brainstem::orchestration::{
    AgentSpoke, FinishExecutor, FinishParams, GroupExecutorOutput, OrchestrationResult,
    SpeakParams, SupervisorDecision,
};
use brainstem::{
    AgentEvent, AgentState, ExecutorResult, GroupExecutor, GroupExecutorTable,
    GroupOrchestrationRuntime, GroupOrchestrationSupervisor, GroupRuntimeConfig, Message,
    OperationRegistry, RuntimeSettings, SupervisorConfig, SupervisorInstruction,
    SupervisorInstructionKind,
};
use serde_json::json;
use tracing::info;

use crate::error::CliError;

/// Lead that hands the floor to each member in turn, then finishes.
struct RoundRobinLead {
    members: Vec<String>,
    next: AtomicUsize,
}

#[async_trait]
impl GroupExecutor for RoundRobinLead {
    async fn execute(
        &self,
        _instruction: SupervisorInstruction,
        state: AgentState,
    ) -> OrchestrationResult<GroupExecutorOutput> {
        let turn = self.next.fetch_add(1, Ordering::SeqCst);
        let decision = match self.members.get(turn) {
            Some(agent_id) => SupervisorDecision::Speak(SpeakParams {
                agent_id: agent_id.clone(),
                instruction: Some("Share your update.".to_string()),
            }),
            None => SupervisorDecision::Finish(FinishParams {
                reason: Some("everyone has spoken".to_string()),
            }),
        };
        Ok(GroupExecutorOutput::new(state, Vec::new())
            .with_result(ExecutorResult::supervisor_decided(decision, false)))
    }
}

/// Member turn: appends a canned reply to the transcript.
struct CannedMember;

#[async_trait]
impl GroupExecutor for CannedMember {
    async fn execute(
        &self,
        instruction: SupervisorInstruction,
        mut state: AgentState,
    ) -> OrchestrationResult<GroupExecutorOutput> {
        let agent_id = match instruction {
            SupervisorInstruction::CallAgent { payload } => payload.agent_id,
            other => other.kind().to_string(),
        };
        let content = format!("{agent_id}: all good on my side");
        state.messages.push(Message::assistant(content.clone()));

        Ok(GroupExecutorOutput::new(state, Vec::new()).with_result(ExecutorResult::AgentSpoke(
            AgentSpoke {
                agent_id,
                content: Some(content),
            },
        )))
    }
}

pub async fn run_group_demo(
    settings: &RuntimeSettings,
    group_id: &str,
    members: Vec<String>,
) -> Result<(), CliError> {
    let supervisor = GroupOrchestrationSupervisor::new(SupervisorConfig::from(
        settings.orchestration.clone(),
    ));

    let executors = GroupExecutorTable::new()
        .with(
            SupervisorInstructionKind::CallSupervisor,
            RoundRobinLead {
                members,
                next: AtomicUsize::new(0),
            },
        )
        .with(SupervisorInstructionKind::CallAgent, CannedMember)
        .with(SupervisorInstructionKind::Finish, FinishExecutor);

    let operations = Arc::new(OperationRegistry::new());
    let operation_id = format!("{group_id}-run");
    operations.register(operation_id.clone(), json!({ "groupId": group_id }));

    let runtime = GroupOrchestrationRuntime::new(
        Arc::new(supervisor),
        GroupRuntimeConfig::new(executors).with_operation(operation_id.clone(), operations.clone()),
    );

    let initial = settings.apply(AgentState::new_session());
    let outcome = runtime.run(initial, Some(group_id.to_string())).await?;
    operations.remove(&operation_id);

    for message in &outcome.final_state.messages {
        println!("  {}", message.content);
    }
    if let Some(AgentEvent::Done { reason_detail, .. }) = outcome.events.last() {
        println!("finished: {}", reason_detail.as_deref().unwrap_or("-"));
    }

    info!(
        group_id,
        steps = outcome.steps,
        cancelled = outcome.cancelled,
        status = %outcome.final_state.status,
        "group demo ended"
    );
    Ok(())
}
