//! Interrupt and resume transitions.
//!
//! These are plain state transforms. They bypass the executor table and never
//! touch `step_count`.

use brainstem_core::{
    AgentEvent, AgentState, AgentStatus, Interruption, RuntimeError, RuntimeResult,
};
use chrono::Utc;
use serde_json::Value;

pub const DEFAULT_RESUME_REASON: &str = "User resumed execution";

/// Move `state` to `interrupted`. The returned event is not yet appended to
/// the state's log.
pub(crate) fn interrupt_state(
    mut state: AgentState,
    reason: impl Into<String>,
    can_resume: bool,
    metadata: Option<Value>,
) -> (AgentState, AgentEvent) {
    let reason = reason.into();
    let now = Utc::now();

    state.status = AgentStatus::Interrupted;
    state.interruption = Some(Interruption {
        reason: reason.clone(),
        interrupted_at: now,
        can_resume,
    });
    state.last_modified = now;

    let event = AgentEvent::Interrupted {
        reason,
        interrupted_at: now,
        can_resume,
        metadata,
    };
    (state, event)
}

/// Move an interrupted `state` back to `running`, or explain why it cannot.
pub(crate) fn resume_state(
    state: &AgentState,
    reason: Option<String>,
) -> RuntimeResult<(AgentState, AgentEvent)> {
    if state.status != AgentStatus::Interrupted {
        return Err(RuntimeError::NotInterrupted);
    }
    if !state.interruption.as_ref().is_some_and(|i| i.can_resume) {
        return Err(RuntimeError::NotResumable);
    }

    let now = Utc::now();
    let mut resumed = state.clone();
    resumed.status = AgentStatus::Running;
    resumed.interruption = None;
    resumed.last_modified = now;

    let event = AgentEvent::Resumed {
        reason: reason.unwrap_or_else(|| DEFAULT_RESUME_REASON.to_string()),
        resumed_at: now,
        resumed_from_step: state.step_count,
    };
    Ok((resumed, event))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_interrupt_sets_status_and_record() {
        let (state, event) = interrupt_state(
            AgentState::new("s").with_step_count(4),
            "paused",
            true,
            Some(json!({ "by": "ops" })),
        );

        assert_eq!(state.status, AgentStatus::Interrupted);
        assert_eq!(state.step_count, 4);
        let interruption = state.interruption.unwrap();
        assert_eq!(interruption.reason, "paused");
        assert!(interruption.can_resume);
        match event {
            AgentEvent::Interrupted { metadata, .. } => assert_eq!(metadata, Some(json!({ "by": "ops" }))),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_resume_preconditions() {
        let idle = AgentState::new("s");
        assert!(matches!(resume_state(&idle, None), Err(RuntimeError::NotInterrupted)));

        let (locked, _) = interrupt_state(AgentState::new("s"), "hard stop", false, None);
        assert!(matches!(resume_state(&locked, None), Err(RuntimeError::NotResumable)));
    }

    #[test]
    fn test_resume_uses_default_reason() {
        let (paused, _) = interrupt_state(AgentState::new("s").with_step_count(2), "x", true, None);
        let (state, event) = resume_state(&paused, None).unwrap();

        assert_eq!(state.status, AgentStatus::Running);
        assert!(state.interruption.is_none());
        match event {
            AgentEvent::Resumed {
                reason,
                resumed_from_step,
                ..
            } => {
                assert_eq!(reason, DEFAULT_RESUME_REASON);
                assert_eq!(resumed_from_step, 2);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }
}
