//! The agent contract and its optional collaborators.
//!
//! An [`Agent`] is the "brain": it only decides which instruction comes next.
//! Everything it can optionally lend the runtime (tools, a model, pricing
//! strategies, executor overrides) is exposed through hooks returning
//! `Option`, where `None` means "skip", never "fail".

use async_trait::async_trait;
use brainstem_core::{
    AgentState, Cost, CostLimit, LlmOutput, ModelChunk, Plan, RuntimeContext, RuntimeResult,
    ToolError, ToolsCalling, Usage,
};
use futures::stream::BoxStream;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use crate::executor::ExecutorTable;

/// A lazily produced sequence of model chunks.
pub type ModelStream = BoxStream<'static, RuntimeResult<ModelChunk>>;

/// Decision-making half of an agent session.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Decide what to do next given what just happened.
    async fn runner(&self, context: &RuntimeContext, state: &AgentState) -> RuntimeResult<Plan>;

    fn tools(&self) -> Option<&ToolRegistry> {
        None
    }

    fn model_runtime(&self) -> Option<&dyn ModelRuntime> {
        None
    }

    fn usage_calculator(&self) -> Option<&dyn UsageCalculator> {
        None
    }

    fn cost_calculator(&self) -> Option<&dyn CostCalculator> {
        None
    }

    /// Executors that take precedence over both configured and built-in ones.
    fn executors(&self) -> ExecutorTable {
        ExecutorTable::new()
    }
}

/// Source of streamed model output for `call_llm`.
#[async_trait]
pub trait ModelRuntime: Send + Sync {
    async fn stream(&self, payload: &Value) -> RuntimeResult<ModelStream>;
}

/// Adapter turning a closure into a [`ModelRuntime`].
pub struct FnModelRuntime<F>(F);

impl<F> FnModelRuntime<F>
where
    F: Fn(Value) -> ModelStream + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

#[async_trait]
impl<F> ModelRuntime for FnModelRuntime<F>
where
    F: Fn(Value) -> ModelStream + Send + Sync,
{
    async fn stream(&self, payload: &Value) -> RuntimeResult<ModelStream> {
        Ok((self.0)(payload.clone()))
    }
}

/// An asynchronous tool implementation.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, args: Value) -> Result<Value, ToolError>;
}

/// Adapter turning an async closure into a [`ToolHandler`].
pub struct FnTool<F>(F);

#[async_trait]
impl<F, Fut> ToolHandler for FnTool<F>
where
    F: Fn(Value) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, ToolError>> + Send + 'static,
{
    async fn call(&self, args: Value) -> Result<Value, ToolError> {
        (self.0)(args).await
    }
}

/// Name-indexed set of tools an agent exposes.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn ToolHandler>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool handler under `name`, replacing any previous one.
    pub fn with_tool(mut self, name: impl Into<String>, handler: impl ToolHandler + 'static) -> Self {
        self.tools.insert(name.into(), Arc::new(handler));
        self
    }

    /// Register an async closure as a tool.
    pub fn with_fn<F, Fut>(self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, ToolError>> + Send + 'static,
    {
        self.with_tool(name, FnTool(f))
    }

    pub fn insert(&mut self, name: impl Into<String>, handler: Arc<dyn ToolHandler>) {
        self.tools.insert(name.into(), handler);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ToolHandler>> {
        self.tools.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Registered tool names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

/// The operation whose usage and cost is being recorded.
#[derive(Debug, Clone, Copy)]
pub enum UsageOperation<'a> {
    Llm {
        payload: &'a Value,
        output: &'a LlmOutput,
        elapsed_ms: u64,
    },
    Tool {
        tool_call: &'a ToolsCalling,
        result: &'a Value,
        execution_time_ms: u64,
    },
}

/// Strategy producing the session usage after an operation.
pub trait UsageCalculator: Send + Sync {
    fn calculate_usage(&self, operation: &UsageOperation<'_>, previous: &Usage) -> Usage;
}

/// Input handed to a [`CostCalculator`].
#[derive(Debug, Clone, Copy)]
pub struct CostContext<'a> {
    pub operation: &'a UsageOperation<'a>,
    /// Usage after the operation was recorded.
    pub usage: &'a Usage,
    pub previous_cost: &'a Cost,
    pub cost_limit: Option<&'a CostLimit>,
}

/// Strategy producing the session cost after an operation.
pub trait CostCalculator: Send + Sync {
    fn calculate_cost(&self, context: &CostContext<'_>) -> Cost;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_registry_with_fn_tool() {
        let tools = ToolRegistry::new()
            .with_fn("double", |args: Value| async move {
                match args["n"].as_i64() {
                    Some(n) => Ok(json!(n * 2)),
                    None => Err(ToolError::InvalidInput("n must be a number".into())),
                }
            });

        assert!(tools.contains("double"));
        assert_eq!(tools.names(), vec!["double".to_string()]);

        let handler = tools.get("double").unwrap();
        assert_eq!(handler.call(json!({ "n": 21 })).await.unwrap(), json!(42));
        assert!(handler.call(json!({})).await.is_err());
    }

    #[tokio::test]
    async fn test_fn_model_runtime_streams_chunks() {
        use futures::StreamExt;

        let runtime = FnModelRuntime::new(|_payload| {
            futures::stream::iter(vec![Ok(ModelChunk::text("a")), Ok(ModelChunk::text("b"))]).boxed()
        });

        let chunks: Vec<_> = runtime
            .stream(&json!({}))
            .await
            .unwrap()
            .collect::<Vec<_>>()
            .await;
        assert_eq!(chunks.len(), 2);
    }
}
