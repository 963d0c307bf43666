//! Error types shared by the agent runtime and its executors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while planning or executing an agent step.
///
/// `AgentRuntime::step` never returns these directly: they are folded into a
/// single `error` event on the resulting state. `resume` is the one entry
/// point that surfaces them to the caller.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The agent's runner failed to produce an instruction.
    #[error("Planning failed: {0}")]
    PlanningFailed(String),

    /// A `call_llm` instruction reached an agent without a model runtime.
    #[error("Model runtime is required for call_llm instruction")]
    ModelRuntimeMissing,

    /// The model stream yielded an error.
    #[error("Model stream error: {0}")]
    ModelStream(String),

    /// The requested tool is not registered on the agent.
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// The tool call arguments could not be decoded.
    #[error("Invalid arguments for tool '{tool}': {message}")]
    InvalidToolArguments { tool: String, message: String },

    /// The tool handler returned an error.
    #[error("Tool '{tool}' failed: {message}")]
    ToolFailed { tool: String, message: String },

    /// No executor is registered for an instruction type.
    #[error("No executor found for instruction type: {0}")]
    ExecutorNotFound(String),

    #[error("Cannot resume: state is not interrupted")]
    NotInterrupted,

    #[error("Cannot resume: interruption is not resumable")]
    NotResumable,

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RuntimeError {
    /// Whether the failure came from the agent's planning logic rather than
    /// from executing an instruction.
    pub fn is_planning_failure(&self) -> bool {
        matches!(self, RuntimeError::PlanningFailed(_))
    }

    /// Whether retrying the same step could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RuntimeError::ModelStream(_) | RuntimeError::ToolFailed { .. }
        )
    }

    /// Get the error code suitable for logging or reporting.
    pub fn error_code(&self) -> &'static str {
        match self {
            RuntimeError::PlanningFailed(_) => "PLANNING_FAILED",
            RuntimeError::ModelRuntimeMissing => "MODEL_RUNTIME_MISSING",
            RuntimeError::ModelStream(_) => "MODEL_STREAM_ERROR",
            RuntimeError::ToolNotFound(_) => "TOOL_NOT_FOUND",
            RuntimeError::InvalidToolArguments { .. } => "INVALID_TOOL_ARGUMENTS",
            RuntimeError::ToolFailed { .. } => "TOOL_FAILED",
            RuntimeError::ExecutorNotFound(_) => "EXECUTOR_NOT_FOUND",
            RuntimeError::NotInterrupted => "NOT_INTERRUPTED",
            RuntimeError::NotResumable => "NOT_RESUMABLE",
            RuntimeError::Serialization(_) => "SERIALIZATION_ERROR",
            RuntimeError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;

impl From<serde_json::Error> for RuntimeError {
    fn from(err: serde_json::Error) -> Self {
        RuntimeError::Serialization(err.to_string())
    }
}

/// Errors a tool handler may report back to the runtime.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ToolError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    Failed(String),
}

/// Serializable error record stored on the state and carried by `error` events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
}

impl ErrorInfo {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl From<&RuntimeError> for ErrorInfo {
    fn from(err: &RuntimeError) -> Self {
        Self::new(err.error_code(), err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RuntimeError::ToolNotFound("search".to_string());
        assert_eq!(err.to_string(), "Tool not found: search");

        let err = RuntimeError::ExecutorNotFound("call_llm".to_string());
        assert_eq!(
            err.to_string(),
            "No executor found for instruction type: call_llm"
        );
    }

    #[test]
    fn test_error_code() {
        assert_eq!(
            RuntimeError::PlanningFailed("boom".into()).error_code(),
            "PLANNING_FAILED"
        );
        assert_eq!(RuntimeError::NotResumable.error_code(), "NOT_RESUMABLE");
    }

    #[test]
    fn test_planning_is_distinguishable() {
        assert!(RuntimeError::PlanningFailed("x".into()).is_planning_failure());
        assert!(!RuntimeError::ToolNotFound("x".into()).is_planning_failure());
    }

    #[test]
    fn test_error_info_from_runtime_error() {
        let info = ErrorInfo::from(&RuntimeError::ToolNotFound("calc".into()));
        assert_eq!(info.code, "TOOL_NOT_FOUND");
        assert_eq!(info.message, "Tool not found: calc");
    }

    #[test]
    fn test_serde_error_conversion() {
        let err: RuntimeError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert_eq!(err.error_code(), "SERIALIZATION_ERROR");
    }
}
