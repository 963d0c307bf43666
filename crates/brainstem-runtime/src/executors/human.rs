//! Executors that park the session until a human answers.
//!
//! None of them produce a next context: the caller collects the decision out
//! of band and comes back through `approve_tool_call` or a `human_response`
//! step.

use async_trait::async_trait;
use brainstem_core::{
    AgentEvent, AgentInstruction, AgentState, AgentStatus, InstructionKind, PendingHumanPrompt,
    PendingHumanSelect, RuntimeResult,
};
use tracing::info;

use super::mismatched;
use crate::agent::Agent;
use crate::executor::{ExecutorOutput, InstructionExecutor};

fn park(state: &mut AgentState) {
    state.clear_pending();
    state.status = AgentStatus::WaitingForHumanInput;
}

pub struct RequestHumanApproveExecutor;

#[async_trait]
impl InstructionExecutor for RequestHumanApproveExecutor {
    async fn execute(
        &self,
        instruction: AgentInstruction,
        mut state: AgentState,
        _agent: &dyn Agent,
    ) -> RuntimeResult<ExecutorOutput> {
        let pending = match instruction {
            AgentInstruction::RequestHumanApprove {
                pending_tools_calling,
            } => pending_tools_calling,
            other => return Err(mismatched(InstructionKind::RequestHumanApprove, &other)),
        };

        park(&mut state);
        state.pending_tools_calling = Some(pending.clone());
        state.usage.human_interaction.approval_requests += 1;

        info!(
            session_id = %state.session_id,
            tools = pending.len(),
            "waiting for tool approval"
        );

        let events = vec![
            AgentEvent::HumanApproveRequired {
                pending_tools_calling: pending.clone(),
                session_id: state.session_id.clone(),
            },
            AgentEvent::ToolPending {
                tool_calls: pending,
            },
        ];
        Ok(ExecutorOutput::new(state, events))
    }
}

pub struct RequestHumanPromptExecutor;

#[async_trait]
impl InstructionExecutor for RequestHumanPromptExecutor {
    async fn execute(
        &self,
        instruction: AgentInstruction,
        mut state: AgentState,
        _agent: &dyn Agent,
    ) -> RuntimeResult<ExecutorOutput> {
        let (prompt, metadata) = match instruction {
            AgentInstruction::RequestHumanPrompt { prompt, metadata } => (prompt, metadata),
            other => return Err(mismatched(InstructionKind::RequestHumanPrompt, &other)),
        };

        park(&mut state);
        state.pending_human_prompt = Some(PendingHumanPrompt {
            prompt: prompt.clone(),
            metadata: metadata.clone(),
        });
        state.usage.human_interaction.prompt_requests += 1;

        info!(session_id = %state.session_id, "waiting for human prompt");

        let event = AgentEvent::HumanPromptRequired {
            prompt,
            metadata,
            session_id: state.session_id.clone(),
        };
        Ok(ExecutorOutput::new(state, vec![event]))
    }
}

pub struct RequestHumanSelectExecutor;

#[async_trait]
impl InstructionExecutor for RequestHumanSelectExecutor {
    async fn execute(
        &self,
        instruction: AgentInstruction,
        mut state: AgentState,
        _agent: &dyn Agent,
    ) -> RuntimeResult<ExecutorOutput> {
        let select = match instruction {
            AgentInstruction::RequestHumanSelect {
                prompt,
                options,
                multi,
                metadata,
            } => PendingHumanSelect {
                prompt,
                options,
                multi,
                metadata,
            },
            other => return Err(mismatched(InstructionKind::RequestHumanSelect, &other)),
        };

        park(&mut state);
        state.pending_human_select = Some(select.clone());
        state.usage.human_interaction.select_requests += 1;

        info!(
            session_id = %state.session_id,
            options = select.options.len(),
            multi = select.multi,
            "waiting for human selection"
        );

        let event = AgentEvent::HumanSelectRequired {
            prompt: select.prompt,
            options: select.options,
            multi: select.multi,
            metadata: select.metadata,
            session_id: state.session_id.clone(),
        };
        Ok(ExecutorOutput::new(state, vec![event]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brainstem_core::{Plan, RuntimeContext, SelectOption, ToolsCalling};
    use serde_json::json;

    struct Idle;

    #[async_trait]
    impl Agent for Idle {
        async fn runner(&self, _context: &RuntimeContext, _state: &AgentState) -> RuntimeResult<Plan> {
            Ok(Plan::new(Vec::new()))
        }
    }

    #[tokio::test]
    async fn test_select_replaces_earlier_request() {
        let mut state = AgentState::new("s");
        state.pending_tools_calling = Some(vec![ToolsCalling::new("c", "x", "{}")]);

        let instruction = AgentInstruction::RequestHumanSelect {
            prompt: "Pick a region".into(),
            options: vec![SelectOption::new("EU", "eu"), SelectOption::new("US", "us")],
            multi: true,
            metadata: Some(json!({ "source": "deploy" })),
        };
        let out = RequestHumanSelectExecutor
            .execute(instruction, state, &Idle)
            .await
            .unwrap();

        assert_eq!(out.new_state.status, AgentStatus::WaitingForHumanInput);
        assert!(out.new_state.pending_tools_calling.is_none());
        let select = out.new_state.pending_human_select.as_ref().unwrap();
        assert_eq!(select.options.len(), 2);
        assert!(select.multi);
        assert_eq!(out.new_state.usage.human_interaction.select_requests, 1);
        assert!(out.next_context.is_none());
        assert!(matches!(
            &out.events[0],
            AgentEvent::HumanSelectRequired { multi: true, session_id, .. } if session_id == "s"
        ));
    }

    #[tokio::test]
    async fn test_prompt_counts_requests() {
        let ask = || AgentInstruction::RequestHumanPrompt {
            prompt: "Which city?".into(),
            metadata: None,
        };

        let first = RequestHumanPromptExecutor
            .execute(ask(), AgentState::new("s"), &Idle)
            .await
            .unwrap();
        let second = RequestHumanPromptExecutor
            .execute(ask(), first.new_state, &Idle)
            .await
            .unwrap();

        assert_eq!(second.new_state.usage.human_interaction.prompt_requests, 2);
        assert_eq!(
            second.new_state.pending_human_prompt.unwrap().prompt,
            "Which city?"
        );
    }

    #[tokio::test]
    async fn test_mismatched_instruction_is_internal_error() {
        let err = RequestHumanApproveExecutor
            .execute(
                AgentInstruction::call_llm(json!({})),
                AgentState::new("s"),
                &Idle,
            )
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "INTERNAL_ERROR");
    }
}
