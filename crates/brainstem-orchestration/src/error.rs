//! Error types for group orchestration.

use brainstem_core::RuntimeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrchestrationError {
    /// No group executor is registered for a supervisor instruction.
    #[error("No executor found for instruction type: {0}")]
    ExecutorNotFound(String),

    /// The supervisor failed to decide.
    #[error("Supervisor failed: {0}")]
    SupervisorFailed(String),

    /// A group executor failed.
    #[error("Executor '{instruction}' failed: {message}")]
    ExecutorFailed {
        instruction: String,
        message: String,
    },

    /// An agent runtime error surfaced through a group executor.
    #[error("Agent runtime error: {0}")]
    Runtime(#[from] RuntimeError),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl OrchestrationError {
    /// Get the error code suitable for logging or reporting.
    pub fn error_code(&self) -> &'static str {
        match self {
            OrchestrationError::ExecutorNotFound(_) => "EXECUTOR_NOT_FOUND",
            OrchestrationError::SupervisorFailed(_) => "SUPERVISOR_FAILED",
            OrchestrationError::ExecutorFailed { .. } => "EXECUTOR_FAILED",
            OrchestrationError::Runtime(err) => err.error_code(),
            OrchestrationError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }
}

/// Result type for orchestration operations.
pub type OrchestrationResult<T> = Result<T, OrchestrationError>;

impl From<serde_json::Error> for OrchestrationError {
    fn from(err: serde_json::Error) -> Self {
        OrchestrationError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = OrchestrationError::ExecutorNotFound("call_agent".into());
        assert_eq!(err.to_string(), "No executor found for instruction type: call_agent");
        assert_eq!(err.error_code(), "EXECUTOR_NOT_FOUND");
    }

    #[test]
    fn test_runtime_error_keeps_code() {
        let err: OrchestrationError = RuntimeError::ToolNotFound("x".into()).into();
        assert_eq!(err.error_code(), "TOOL_NOT_FOUND");
    }
}
