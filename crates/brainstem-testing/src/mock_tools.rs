//! # Mock Tools for Testing
//!
//! Tool handlers that return predictable responses and record every call.

use async_trait::async_trait;
use brainstem_core::ToolError;
use brainstem_runtime::{ToolHandler, ToolRegistry};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Debug, Clone)]
enum MockResponse {
    Success(Value),
    Failure(String),
}

impl MockResponse {
    fn to_result(&self) -> Result<Value, ToolError> {
        match self {
            MockResponse::Success(value) => Ok(value.clone()),
            MockResponse::Failure(message) => Err(ToolError::Failed(message.clone())),
        }
    }
}

/// A mock tool that returns predefined responses keyed by its arguments.
///
/// Clones share call tracking, so a test can keep one clone for inspection
/// and register another with the agent.
#[derive(Debug, Clone)]
pub struct MockTool {
    name: String,
    responses: HashMap<String, MockResponse>,
    default_response: Option<MockResponse>,
    call_history: Arc<Mutex<Vec<Value>>>,
}

impl MockTool {
    /// Create a new mock tool with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            responses: HashMap::new(),
            default_response: None,
            call_history: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add a response for specific arguments
    pub fn with_response(mut self, args: Value, response: Value) -> Self {
        self.responses
            .insert(args.to_string(), MockResponse::Success(response));
        self
    }

    /// Add a failure for specific arguments
    pub fn with_failure(mut self, args: Value, error: impl Into<String>) -> Self {
        self.responses
            .insert(args.to_string(), MockResponse::Failure(error.into()));
        self
    }

    /// Set a default response for any unmatched arguments
    pub fn with_default_response(mut self, response: Value) -> Self {
        self.default_response = Some(MockResponse::Success(response));
        self
    }

    /// Fail every unmatched call
    pub fn with_default_failure(mut self, error: impl Into<String>) -> Self {
        self.default_response = Some(MockResponse::Failure(error.into()));
        self
    }

    fn history(&self) -> std::sync::MutexGuard<'_, Vec<Value>> {
        self.call_history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of times this tool has been called
    pub fn call_count(&self) -> usize {
        self.history().len()
    }

    /// Arguments of every call so far
    pub fn call_history(&self) -> Vec<Value> {
        self.history().clone()
    }

    pub fn reset(&self) {
        self.history().clear();
    }

    pub fn was_called_with(&self, args: &Value) -> bool {
        self.history().contains(args)
    }
}

#[async_trait]
impl ToolHandler for MockTool {
    async fn call(&self, args: Value) -> Result<Value, ToolError> {
        self.history().push(args.clone());

        if let Some(response) = self.responses.get(&args.to_string()) {
            response.to_result()
        } else if let Some(default) = &self.default_response {
            default.to_result()
        } else {
            Ok(json!({ "tool": self.name, "args": args }))
        }
    }
}

/// Register clones of the given mock tools under their own names.
pub fn mock_registry<'a>(tools: impl IntoIterator<Item = &'a MockTool>) -> ToolRegistry {
    tools.into_iter().fold(ToolRegistry::new(), |registry, tool| {
        registry.with_tool(tool.name.clone(), tool.clone())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_tool_responses() {
        let tool = MockTool::new("search")
            .with_response(json!({ "q": "rust" }), json!(["tokio", "serde"]))
            .with_failure(json!({ "q": "" }), "empty query");

        assert_eq!(
            tool.call(json!({ "q": "rust" })).await.unwrap(),
            json!(["tokio", "serde"])
        );
        assert!(tool.call(json!({ "q": "" })).await.is_err());
        assert_eq!(
            tool.call(json!({ "q": "other" })).await.unwrap(),
            json!({ "tool": "search", "args": { "q": "other" } })
        );
        assert_eq!(tool.call_count(), 3);
        assert!(tool.was_called_with(&json!({ "q": "rust" })));
    }

    #[tokio::test]
    async fn test_clones_share_history() {
        let tool = MockTool::new("echo").with_default_response(json!("ok"));
        let registry = mock_registry([&tool]);

        let handler = registry.get("echo").unwrap();
        handler.call(json!({})).await.unwrap();

        assert_eq!(tool.call_count(), 1);
        tool.reset();
        assert_eq!(tool.call_count(), 0);
    }
}
