pub mod approval;
pub mod echo;

pub use approval::run_approval_agent;
pub use echo::run_echo_agent;

use brainstem::{AgentEvent, AgentRuntime, AgentState, AgentStatus, Message, RuntimeSettings};
use serde_json::{Value, json};
use tracing::info;

/// Upper bound on runtime calls per demo session.
const MAX_DEMO_CALLS: u32 = 32;

/// Model payload carrying the whole conversation.
pub(crate) fn conversation_payload(state: &AgentState) -> Value {
    json!({ "messages": state.messages })
}

/// Last message of a payload built by [`conversation_payload`].
pub(crate) fn last_message(payload: &Value) -> Option<Message> {
    payload["messages"]
        .as_array()
        .and_then(|messages| messages.last())
        .and_then(|message| serde_json::from_value(message.clone()).ok())
}

fn print_event(event: &AgentEvent) {
    match event {
        AgentEvent::LlmStream { chunk } => {
            if let Some(content) = &chunk.content {
                println!("  [llm_stream] {content}");
            }
        }
        AgentEvent::LlmResult { result } => println!("  [llm_result] {}", result.content),
        AgentEvent::ToolResult { id, result } => println!("  [tool_result] {id}: {result}"),
        AgentEvent::HumanApproveRequired {
            pending_tools_calling,
            ..
        } => {
            for call in pending_tools_calling {
                println!(
                    "  [approve?] {} {} (auto-approving)",
                    call.name(),
                    call.function.arguments
                );
            }
        }
        AgentEvent::Done {
            reason,
            reason_detail,
            ..
        } => match reason_detail {
            Some(detail) => println!("  [done] {reason}: {detail}"),
            None => println!("  [done] {reason}"),
        },
        AgentEvent::Error { error, .. } => println!("  [error] {}: {}", error.code, error.message),
        other => println!("  [{}]", other.name()),
    }
}

/// Step a session until it is done or errors, approving every pending tool call.
pub(crate) async fn drive(
    runtime: &AgentRuntime,
    settings: &RuntimeSettings,
    input: &str,
) -> AgentState {
    let mut state = settings
        .apply(AgentState::new_session())
        .with_message(Message::user(input));
    let mut context = None;

    for _ in 0..MAX_DEMO_CALLS {
        let pending = match state.status {
            AgentStatus::WaitingForHumanInput => state
                .pending_tools_calling
                .as_ref()
                .and_then(|calls| calls.first().cloned()),
            _ => None,
        };

        let result = match pending {
            Some(call) => runtime.approve_tool_call(&state, call).await,
            None => runtime.step(&state, context.take()).await,
        };

        println!("step {}", result.new_state.step_count);
        for event in &result.events {
            print_event(event);
        }

        state = result.new_state;
        context = result.next_context;
        if state.status.is_terminal() {
            break;
        }
    }

    info!(
        session_id = %state.session_id,
        status = %state.status,
        steps = state.step_count,
        tokens = state.usage.llm.tokens.total,
        cost = state.cost.total,
        "demo session ended"
    );
    state
}
