//! Full group runs: supervisor state machine driving host executors.

use brainstem_core::{AgentEvent, AgentState, AgentStatus, FinishReason, Message};
use brainstem_orchestration::{
    AgentsBroadcasted, BroadcastParams, ExecutorResult, FinishExecutor, FinishParams,
    FnGroupExecutor, FnOperationLookup, GroupExecutor, GroupExecutorOutput, GroupExecutorTable,
    GroupOrchestrationRuntime, GroupOrchestrationSupervisor, GroupRuntimeConfig,
    OperationHandle, OperationRegistry, OrchestrationError, REASON_MAX_ROUNDS_EXCEEDED,
    REASON_SKIP_CALL_SUPERVISOR, SpeakParams, SupervisorConfig, SupervisorDecision,
    SupervisorInstruction, SupervisorInstructionKind,
};
use rstest::rstest;
use serde_json::json;
use std::sync::{Arc, Mutex};

fn supervisor(max_rounds: u32) -> Arc<GroupOrchestrationSupervisor> {
    Arc::new(GroupOrchestrationSupervisor::new(SupervisorConfig::new(
        max_rounds, "lead",
    )))
}

fn decide(decision: SupervisorDecision, skip: bool) -> impl GroupExecutor + 'static {
    FnGroupExecutor::new(move |_, state| {
        Ok(GroupExecutorOutput::new(state, vec![])
            .with_result(ExecutorResult::supervisor_decided(decision.clone(), skip)))
    })
}

fn speak_to(agent_id: &str) -> SupervisorDecision {
    SupervisorDecision::Speak(SpeakParams {
        agent_id: agent_id.to_string(),
        instruction: None,
    })
}

fn member_replies() -> impl GroupExecutor + 'static {
    FnGroupExecutor::new(|instruction, mut state: AgentState| {
        let SupervisorInstruction::CallAgent { payload } = instruction else {
            panic!("member executor only handles call_agent");
        };
        state
            .messages
            .push(Message::assistant(format!("{} spoke", payload.agent_id)));
        Ok(GroupExecutorOutput::new(state, vec![])
            .with_result(ExecutorResult::agent_spoke(payload.agent_id)))
    })
}

fn done_detail(events: &[AgentEvent]) -> Option<String> {
    match events.last() {
        Some(AgentEvent::Done { reason_detail, .. }) => reason_detail.clone(),
        _ => None,
    }
}

#[tokio::test]
async fn test_run_stops_at_max_rounds() {
    let rounds = Arc::new(Mutex::new(Vec::new()));
    let seen = rounds.clone();
    let executors = GroupExecutorTable::new()
        .with(
            SupervisorInstructionKind::CallSupervisor,
            FnGroupExecutor::new(move |instruction, state| {
                if let SupervisorInstruction::CallSupervisor { payload } = instruction {
                    seen.lock().unwrap().push((payload.group_id, payload.round));
                }
                Ok(GroupExecutorOutput::new(state, vec![])
                    .with_result(ExecutorResult::supervisor_decided(speak_to("alice"), false)))
            }),
        )
        .with(SupervisorInstructionKind::CallAgent, member_replies())
        .with(SupervisorInstructionKind::Finish, FinishExecutor);

    let lead = supervisor(2);
    let runtime = GroupOrchestrationRuntime::new(lead.clone(), GroupRuntimeConfig::new(executors));

    let outcome = runtime
        .run(AgentState::new("session-1"), Some("team".into()))
        .await
        .unwrap();

    // call_supervisor, call_agent, call_supervisor, call_agent, finish
    assert_eq!(outcome.steps, 5);
    assert!(!outcome.cancelled);
    assert_eq!(outcome.final_state.step_count, 5);
    assert_eq!(outcome.final_state.status, AgentStatus::Done);
    assert_eq!(outcome.final_state.messages.len(), 2);
    assert_eq!(
        *rounds.lock().unwrap(),
        vec![("team".to_string(), 0), ("team".to_string(), 1)]
    );
    assert_eq!(
        done_detail(&outcome.events).as_deref(),
        Some(REASON_MAX_ROUNDS_EXCEEDED)
    );
    assert_eq!(lead.round(), 2);
}

#[tokio::test]
async fn test_group_id_defaults_to_session_id() {
    let executors = GroupExecutorTable::new()
        .with(
            SupervisorInstructionKind::CallSupervisor,
            FnGroupExecutor::new(|instruction, state| {
                let SupervisorInstruction::CallSupervisor { payload } = instruction else {
                    panic!("expected call_supervisor");
                };
                assert_eq!(payload.group_id, "session-9");
                Ok(GroupExecutorOutput::new(state, vec![]).with_result(
                    ExecutorResult::supervisor_decided(
                        SupervisorDecision::Finish(FinishParams {
                            reason: Some("nothing to discuss".into()),
                        }),
                        false,
                    ),
                ))
            }),
        )
        .with(SupervisorInstructionKind::Finish, FinishExecutor);
    let runtime = GroupOrchestrationRuntime::new(supervisor(5), GroupRuntimeConfig::new(executors));

    let outcome = runtime.run(AgentState::new("session-9"), None).await.unwrap();

    assert_eq!(outcome.steps, 2);
    assert_eq!(done_detail(&outcome.events).as_deref(), Some("nothing to discuss"));
}

#[tokio::test]
async fn test_skip_supervisor_after_broadcast() {
    let broadcast = SupervisorDecision::Broadcast(BroadcastParams {
        agent_ids: vec!["alice".into(), "bob".into()],
        instruction: Some("status?".into()),
        tool_message_id: None,
    });
    let executors = GroupExecutorTable::new()
        .with(SupervisorInstructionKind::CallSupervisor, decide(broadcast, true))
        .with(
            SupervisorInstructionKind::ParallelCallAgents,
            FnGroupExecutor::new(|instruction, state| {
                let SupervisorInstruction::ParallelCallAgents { payload } = instruction else {
                    panic!("expected parallel_call_agents");
                };
                Ok(GroupExecutorOutput::new(state, vec![]).with_result(
                    ExecutorResult::AgentsBroadcasted(AgentsBroadcasted {
                        agent_ids: payload.agent_ids,
                    }),
                ))
            }),
        )
        .with(SupervisorInstructionKind::Finish, FinishExecutor);
    let runtime = GroupOrchestrationRuntime::new(supervisor(10), GroupRuntimeConfig::new(executors));

    let outcome = runtime.run(AgentState::new("s"), None).await.unwrap();

    assert_eq!(outcome.steps, 3);
    assert_eq!(
        done_detail(&outcome.events).as_deref(),
        Some(REASON_SKIP_CALL_SUPERVISOR)
    );
}

#[tokio::test]
async fn test_cancellation_stops_after_current_step() {
    let operations = Arc::new(OperationRegistry::new());
    operations.register("op-1", json!({ "requestedBy": "ops" }));

    let canceller = operations.clone();
    let executors = GroupExecutorTable::new()
        .with(SupervisorInstructionKind::CallSupervisor, decide(speak_to("alice"), false))
        .with(
            SupervisorInstructionKind::CallAgent,
            FnGroupExecutor::new(move |_, state| {
                assert!(canceller.cancel("op-1"));
                Ok(GroupExecutorOutput::new(state, vec![])
                    .with_result(ExecutorResult::agent_spoke("alice")))
            }),
        );
    let runtime = GroupOrchestrationRuntime::new(
        supervisor(10),
        GroupRuntimeConfig::new(executors).with_operation("op-1", operations.clone()),
    );

    assert_eq!(runtime.context(), Some(json!({ "requestedBy": "ops" })));

    let outcome = runtime.run(AgentState::new("s"), None).await.unwrap();

    assert!(outcome.cancelled);
    assert_eq!(outcome.steps, 2);
    assert_ne!(outcome.final_state.status, AgentStatus::Done);
    assert!(runtime.cancellation_token().unwrap().is_cancelled());
}

#[tokio::test]
async fn test_missing_executor_is_an_error() {
    let executors = GroupExecutorTable::new()
        .with(SupervisorInstructionKind::CallSupervisor, decide(speak_to("alice"), false));
    let runtime = GroupOrchestrationRuntime::new(supervisor(3), GroupRuntimeConfig::new(executors));

    let err = runtime.run(AgentState::new("s"), None).await.unwrap_err();

    match err {
        OrchestrationError::ExecutorNotFound(kind) => assert_eq!(kind, "call_agent"),
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn test_state_max_steps_ends_run() {
    let executors = GroupExecutorTable::new()
        .with(SupervisorInstructionKind::CallSupervisor, decide(speak_to("alice"), false))
        .with(SupervisorInstructionKind::CallAgent, member_replies());
    let runtime = GroupOrchestrationRuntime::new(supervisor(100), GroupRuntimeConfig::new(executors));

    let outcome = runtime
        .run(AgentState::new("s").with_max_steps(3), None)
        .await
        .unwrap();

    assert_eq!(outcome.steps, 4);
    assert_eq!(outcome.final_state.status, AgentStatus::Done);
    match outcome.events.last().unwrap() {
        AgentEvent::Done {
            reason,
            reason_detail,
            ..
        } => {
            assert_eq!(*reason, FinishReason::MaxStepsExceeded);
            assert_eq!(reason_detail.as_deref(), Some("Maximum steps exceeded: 3"));
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[tokio::test]
async fn test_closure_operation_lookup() {
    let handle = OperationHandle::new(json!({ "tenant": "acme" }));
    let token = handle.cancellation.clone();
    let lookup = FnOperationLookup::new(move |id: &str| (id == "op-7").then(|| handle.clone()));
    let runtime = GroupOrchestrationRuntime::new(
        supervisor(1),
        GroupRuntimeConfig::new(GroupExecutorTable::new()).with_operation("op-7", Arc::new(lookup)),
    );

    assert_eq!(runtime.context(), Some(json!({ "tenant": "acme" })));
    token.cancel();
    assert!(runtime.cancellation_token().unwrap().is_cancelled());
}

#[rstest]
#[case::delegation(
    ExecutorResult::Delegated(brainstem_orchestration::Delegated { agent_id: "bob".into() }),
    "delegated_to_bob"
)]
#[case::unknown_result(
    ExecutorResult::Unknown { result_type: "agent_sang".into(), payload: json!({}) },
    "unknown_result_type"
)]
#[case::finish_without_reason(
    ExecutorResult::supervisor_decided(SupervisorDecision::Finish(FinishParams::default()), false),
    "supervisor_finished"
)]
#[tokio::test]
async fn test_terminal_results_finish_the_run(
    #[case] member_result: ExecutorResult,
    #[case] expected_reason: &str,
) {
    let executors = GroupExecutorTable::new()
        .with(SupervisorInstructionKind::CallSupervisor, decide(speak_to("alice"), false))
        .with(
            SupervisorInstructionKind::CallAgent,
            FnGroupExecutor::new(move |_, state| {
                Ok(GroupExecutorOutput::new(state, vec![]).with_result(member_result.clone()))
            }),
        )
        .with(SupervisorInstructionKind::Finish, FinishExecutor);
    let runtime = GroupOrchestrationRuntime::new(supervisor(10), GroupRuntimeConfig::new(executors));

    let outcome = runtime.run(AgentState::new("s"), None).await.unwrap();

    assert_eq!(outcome.steps, 3);
    assert_eq!(done_detail(&outcome.events).as_deref(), Some(expected_reason));
}
