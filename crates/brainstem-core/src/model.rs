//! Streamed model output.

use serde::{Deserialize, Serialize};

use crate::message::ToolsCalling;
use crate::usage::ModelUsage;

/// One item of a model's streamed response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelChunk {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolsCalling>>,
    /// Provider-reported usage, usually only on the final chunk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<ModelUsage>,
}

impl ModelChunk {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    pub fn tool_calls(tool_calls: Vec<ToolsCalling>) -> Self {
        Self {
            tool_calls: Some(tool_calls),
            ..Self::default()
        }
    }

    pub fn usage(usage: ModelUsage) -> Self {
        Self {
            usage: Some(usage),
            ..Self::default()
        }
    }
}

/// The folded result of a model stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LlmOutput {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolsCalling>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<ModelUsage>,
}

impl LlmOutput {
    /// Fold one chunk in: content is concatenated, tool calls and usage are
    /// replaced by the latest chunk that carries them.
    pub fn absorb(&mut self, chunk: &ModelChunk) {
        if let Some(content) = &chunk.content {
            self.content.push_str(content);
        }
        if let Some(tool_calls) = &chunk.tool_calls {
            self.tool_calls = Some(tool_calls.clone());
        }
        if let Some(usage) = &chunk.usage {
            self.usage = Some(usage.clone());
        }
    }

    pub fn has_tool_calls(&self) -> bool {
        self.tool_calls.as_ref().is_some_and(|calls| !calls.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absorb_concatenates_and_keeps_last_tool_calls() {
        let mut out = LlmOutput::default();
        out.absorb(&ModelChunk::text("Hel"));
        out.absorb(&ModelChunk::tool_calls(vec![ToolsCalling::new("a", "x", "{}")]));
        out.absorb(&ModelChunk::text("lo"));
        out.absorb(&ModelChunk::tool_calls(vec![ToolsCalling::new("b", "y", "{}")]));

        assert_eq!(out.content, "Hello");
        let calls = out.tool_calls.as_ref().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].id, "b");
        assert!(out.has_tool_calls());
    }

    #[test]
    fn test_empty_tool_calls_are_not_tool_calls() {
        let mut out = LlmOutput::default();
        out.absorb(&ModelChunk::tool_calls(Vec::new()));
        assert!(!out.has_tool_calls());
    }
}
