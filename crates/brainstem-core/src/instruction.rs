//! Instructions an agent hands to the runtime.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::events::FinishReason;
use crate::message::ToolsCalling;
use crate::state::SelectOption;

/// A request from the agent naming the next operation to perform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum AgentInstruction {
    CallLlm {
        payload: Value,
    },
    CallTool {
        payload: ToolsCalling,
    },
    RequestHumanPrompt {
        prompt: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        metadata: Option<Value>,
    },
    RequestHumanSelect {
        prompt: String,
        options: Vec<SelectOption>,
        #[serde(default)]
        multi: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        metadata: Option<Value>,
    },
    RequestHumanApprove {
        pending_tools_calling: Vec<ToolsCalling>,
    },
    ResolveAbortedTools {
        tools_calling: Vec<ToolsCalling>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parent_message_id: Option<String>,
    },
    Finish {
        reason: FinishReason,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason_detail: Option<String>,
    },
}

impl AgentInstruction {
    pub fn call_llm(payload: Value) -> Self {
        AgentInstruction::CallLlm { payload }
    }

    pub fn call_tool(tool_call: ToolsCalling) -> Self {
        AgentInstruction::CallTool { payload: tool_call }
    }

    pub fn finish(reason: FinishReason, reason_detail: Option<String>) -> Self {
        AgentInstruction::Finish {
            reason,
            reason_detail,
        }
    }

    /// The dispatch key of this instruction.
    pub fn kind(&self) -> InstructionKind {
        match self {
            AgentInstruction::CallLlm { .. } => InstructionKind::CallLlm,
            AgentInstruction::CallTool { .. } => InstructionKind::CallTool,
            AgentInstruction::RequestHumanPrompt { .. } => InstructionKind::RequestHumanPrompt,
            AgentInstruction::RequestHumanSelect { .. } => InstructionKind::RequestHumanSelect,
            AgentInstruction::RequestHumanApprove { .. } => InstructionKind::RequestHumanApprove,
            AgentInstruction::ResolveAbortedTools { .. } => InstructionKind::ResolveAbortedTools,
            AgentInstruction::Finish { .. } => InstructionKind::Finish,
        }
    }
}

/// Fieldless discriminant of [`AgentInstruction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstructionKind {
    CallLlm,
    CallTool,
    RequestHumanPrompt,
    RequestHumanSelect,
    RequestHumanApprove,
    ResolveAbortedTools,
    Finish,
}

impl InstructionKind {
    pub const ALL: [InstructionKind; 7] = [
        InstructionKind::CallLlm,
        InstructionKind::CallTool,
        InstructionKind::RequestHumanPrompt,
        InstructionKind::RequestHumanSelect,
        InstructionKind::RequestHumanApprove,
        InstructionKind::ResolveAbortedTools,
        InstructionKind::Finish,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InstructionKind::CallLlm => "call_llm",
            InstructionKind::CallTool => "call_tool",
            InstructionKind::RequestHumanPrompt => "request_human_prompt",
            InstructionKind::RequestHumanSelect => "request_human_select",
            InstructionKind::RequestHumanApprove => "request_human_approve",
            InstructionKind::ResolveAbortedTools => "resolve_aborted_tools",
            InstructionKind::Finish => "finish",
        }
    }
}

impl std::fmt::Display for InstructionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The ordered instructions produced by one planning call.
///
/// The runtime executes them in order within a single step and stops early
/// once the session blocks on a human or ends.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Plan(Vec<AgentInstruction>);

impl Plan {
    pub fn new(instructions: Vec<AgentInstruction>) -> Self {
        Self(instructions)
    }

    pub fn then(mut self, instruction: AgentInstruction) -> Self {
        self.0.push(instruction);
        self
    }

    pub fn instructions(&self) -> &[AgentInstruction] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<AgentInstruction> for Plan {
    fn from(instruction: AgentInstruction) -> Self {
        Self(vec![instruction])
    }
}

impl From<Vec<AgentInstruction>> for Plan {
    fn from(instructions: Vec<AgentInstruction>) -> Self {
        Self(instructions)
    }
}

impl IntoIterator for Plan {
    type Item = AgentInstruction;
    type IntoIter = std::vec::IntoIter<AgentInstruction>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[test]
    fn test_instruction_wire_format() {
        let instruction = AgentInstruction::call_tool(ToolsCalling::new("c1", "calc", "{}"));
        let value = serde_json::to_value(&instruction).unwrap();
        assert_eq!(value["type"], json!("call_tool"));
        assert_eq!(value["payload"]["function"]["name"], json!("calc"));

        let parsed: AgentInstruction = serde_json::from_value(json!({
            "type": "request_human_approve",
            "pendingToolsCalling": [
                { "id": "c2", "type": "function", "function": { "name": "rm", "arguments": "{}" } }
            ]
        }))
        .unwrap();
        assert_eq!(parsed.kind(), InstructionKind::RequestHumanApprove);
    }

    #[rstest]
    #[case(InstructionKind::CallLlm, "call_llm")]
    #[case(InstructionKind::RequestHumanSelect, "request_human_select")]
    #[case(InstructionKind::ResolveAbortedTools, "resolve_aborted_tools")]
    fn test_kind_matches_wire_tag(#[case] kind: InstructionKind, #[case] tag: &str) {
        assert_eq!(kind.as_str(), tag);
        assert_eq!(serde_json::to_value(kind).unwrap(), json!(tag));
    }

    #[test]
    fn test_plan_from_single_instruction() {
        let plan = Plan::from(AgentInstruction::finish(FinishReason::Completed, None))
            .then(AgentInstruction::call_llm(json!({})));
        assert_eq!(plan.len(), 2);
        assert_eq!(plan.instructions()[0].kind(), InstructionKind::Finish);
    }
}
