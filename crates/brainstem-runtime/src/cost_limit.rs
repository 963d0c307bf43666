//! Enforcement of a session's cost limit after usage accounting.

use brainstem_core::{
    AgentEvent, AgentState, AgentStatus, CostLimitAction, ErrorInfo, FinishReason, Phase,
    RuntimeContext,
};
use serde_json::json;
use tracing::warn;

use crate::executor::ExecutorOutput;
use crate::lifecycle::interrupt_state;

pub const COST_WARNING_CODE: &str = "COST_LIMIT_WARNING";

/// True when the state carries a limit and its total cost is above it.
pub fn is_cost_limit_exceeded(state: &AgentState) -> bool {
    state
        .cost_limit
        .as_ref()
        .is_some_and(|limit| state.cost.total > limit.max_total_cost)
}

/// Apply the configured policy to an executor's output. Events the executor
/// already emitted are kept; the policy event is appended after them.
pub(crate) fn enforce(mut output: ExecutorOutput) -> ExecutorOutput {
    if !is_cost_limit_exceeded(&output.new_state) {
        return output;
    }
    let Some(limit) = output.new_state.cost_limit.clone() else {
        return output;
    };

    let total = output.new_state.cost.total;
    let currency = output.new_state.cost.currency.clone();
    warn!(
        session_id = %output.new_state.session_id,
        total,
        limit = limit.max_total_cost,
        policy = ?limit.on_exceeded,
        "cost limit exceeded"
    );

    match limit.on_exceeded {
        CostLimitAction::Stop => {
            let mut state = output.new_state;
            state.status = AgentStatus::Done;
            let detail = format!(
                "Cost limit exceeded: {total} {currency} > {} {}",
                limit.max_total_cost, limit.currency
            );
            output
                .events
                .push(AgentEvent::done(&state, FinishReason::CostLimitExceeded, Some(detail)));
            output.new_state = state;
            output.next_context = None;
        }
        CostLimitAction::Interrupt => {
            let (state, event) = interrupt_state(
                output.new_state,
                format!("Cost limit exceeded: {total} {currency}"),
                true,
                Some(json!({
                    "costExceeded": true,
                    "currentCost": total,
                    "limitCost": limit.max_total_cost,
                })),
            );
            output.events.push(event);
            output.new_state = state;
            output.next_context = None;
        }
        CostLimitAction::Warn => {
            let error = ErrorInfo::new(
                COST_WARNING_CODE,
                format!("Warning: Cost limit exceeded: {total} {currency}"),
            );
            output.events.push(AgentEvent::Error {
                error: error.clone(),
                is_cost_warning: true,
            });
            output.next_context = Some(RuntimeContext::new(
                Phase::Error {
                    error,
                    is_cost_warning: true,
                },
                &output.new_state,
            ));
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use brainstem_core::CostLimit;

    fn over_limit(action: CostLimitAction) -> ExecutorOutput {
        let mut state = AgentState::new("s")
            .with_status(AgentStatus::Running)
            .with_cost_limit(CostLimit::new(0.05).with_action(action));
        state.cost.total = 0.08;
        ExecutorOutput::new(state, vec![AgentEvent::Init])
    }

    #[test]
    fn test_under_limit_is_untouched() {
        let mut output = over_limit(CostLimitAction::Stop);
        output.new_state.cost.total = 0.05;
        let out = enforce(output);
        assert_eq!(out.events.len(), 1);
        assert_eq!(out.new_state.status, AgentStatus::Running);
    }

    #[test]
    fn test_stop_policy_finishes() {
        let out = enforce(over_limit(CostLimitAction::Stop));
        assert_eq!(out.new_state.status, AgentStatus::Done);
        assert_eq!(out.events.len(), 2);
        match &out.events[1] {
            AgentEvent::Done {
                reason,
                reason_detail,
                ..
            } => {
                assert_eq!(*reason, FinishReason::CostLimitExceeded);
                assert_eq!(
                    reason_detail.as_deref(),
                    Some("Cost limit exceeded: 0.08 USD > 0.05 USD")
                );
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert!(out.next_context.is_none());
    }

    #[test]
    fn test_interrupt_policy_is_resumable() {
        let out = enforce(over_limit(CostLimitAction::Interrupt));
        assert_eq!(out.new_state.status, AgentStatus::Interrupted);
        assert!(out.new_state.interruption.as_ref().unwrap().can_resume);
        match &out.events[1] {
            AgentEvent::Interrupted { reason, metadata, .. } => {
                assert_eq!(reason, "Cost limit exceeded: 0.08 USD");
                assert_eq!(metadata.as_ref().unwrap()["costExceeded"], json!(true));
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_warn_policy_continues_with_error_phase() {
        let out = enforce(over_limit(CostLimitAction::Warn));
        assert_eq!(out.new_state.status, AgentStatus::Running);
        assert!(matches!(
            out.events[1],
            AgentEvent::Error {
                is_cost_warning: true,
                ..
            }
        ));
        let ctx = out.next_context.unwrap();
        assert!(matches!(
            ctx.phase,
            Phase::Error {
                is_cost_warning: true,
                ..
            }
        ));
    }
}
