//! # Brainstem Testing
//!
//! Test doubles for Brainstem runtimes: a [`ScriptedAgent`] whose plans are
//! queued up front, a [`ScriptedModelRuntime`] replaying model streams,
//! [`MockTool`] handlers with call tracking, [`FlatRatePricing`] usage and
//! cost strategies, and a [`ScriptedGroupExecutor`] for group runs.
//!
//! ```rust,ignore
//! let search = MockTool::new("search").with_default_response(json!(["result"]));
//! let agent = ScriptedAgent::new()
//!     .then(AgentInstruction::call_tool(ToolsCalling::new("c1", "search", "{}")))
//!     .with_tools(mock_registry([&search]));
//! let runtime = AgentRuntime::new(Arc::new(agent));
//! let result = runtime.step(&AgentState::new("s"), None).await;
//! assert_eq!(search.call_count(), 1);
//! ```

/// Scripted agent
pub mod agent;
/// Scripted group executors
pub mod group;
/// Mock tools for predictable testing
pub mod mock_tools;
/// Scripted model streams
pub mod model;
/// Flat-rate usage and cost strategies
pub mod pricing;

pub use agent::ScriptedAgent;
pub use group::ScriptedGroupExecutor;
pub use mock_tools::{MockTool, mock_registry};
pub use model::ScriptedModelRuntime;
pub use pricing::FlatRatePricing;
