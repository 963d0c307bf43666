//! Scripted agent for driving the runtime from tests.

use async_trait::async_trait;
use brainstem_core::{
    AgentInstruction, AgentState, FinishReason, InstructionKind, Plan, RuntimeContext,
    RuntimeError, RuntimeResult,
};
use brainstem_runtime::{
    Agent, CostCalculator, ExecutorTable, InstructionExecutor, ModelRuntime, ToolRegistry,
    UsageCalculator,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use crate::pricing::FlatRatePricing;

enum Scripted {
    Plan(Plan),
    Fail(String),
}

/// An agent whose plans are queued up front.
///
/// Every `runner` call pops the next plan and records the context it was
/// given. An exhausted script finishes the session with `completed`.
#[derive(Default)]
pub struct ScriptedAgent {
    script: Mutex<VecDeque<Scripted>>,
    contexts: Mutex<Vec<RuntimeContext>>,
    tools: Option<ToolRegistry>,
    model: Option<Arc<dyn ModelRuntime>>,
    pricing: Option<FlatRatePricing>,
    executors: ExecutorTable,
}

impl ScriptedAgent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the next plan.
    pub fn then(self, plan: impl Into<Plan>) -> Self {
        self.push(Scripted::Plan(plan.into()));
        self
    }

    /// Queue a planning failure.
    pub fn then_fail(self, message: impl Into<String>) -> Self {
        self.push(Scripted::Fail(message.into()));
        self
    }

    fn push(&self, scripted: Scripted) {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(scripted);
    }

    pub fn with_tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = Some(tools);
        self
    }

    pub fn with_model(mut self, model: Arc<dyn ModelRuntime>) -> Self {
        self.model = Some(model);
        self
    }

    pub fn with_pricing(mut self, pricing: FlatRatePricing) -> Self {
        self.pricing = Some(pricing);
        self
    }

    pub fn with_executor(
        mut self,
        kind: InstructionKind,
        executor: impl InstructionExecutor + 'static,
    ) -> Self {
        self.executors = self.executors.with(kind, executor);
        self
    }

    /// Contexts passed to `runner`, in call order.
    pub fn contexts(&self) -> Vec<RuntimeContext> {
        self.contexts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn runner_calls(&self) -> usize {
        self.contexts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Plans still queued.
    pub fn remaining(&self) -> usize {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[async_trait]
impl Agent for ScriptedAgent {
    async fn runner(&self, context: &RuntimeContext, _state: &AgentState) -> RuntimeResult<Plan> {
        self.contexts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(context.clone());

        let next = self
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();

        match next {
            Some(Scripted::Plan(plan)) => Ok(plan),
            Some(Scripted::Fail(message)) => Err(RuntimeError::PlanningFailed(message)),
            None => Ok(Plan::from(AgentInstruction::finish(
                FinishReason::Completed,
                None,
            ))),
        }
    }

    fn tools(&self) -> Option<&ToolRegistry> {
        self.tools.as_ref()
    }

    fn model_runtime(&self) -> Option<&dyn ModelRuntime> {
        self.model.as_deref()
    }

    fn usage_calculator(&self) -> Option<&dyn UsageCalculator> {
        self.pricing.as_ref().map(|p| p as &dyn UsageCalculator)
    }

    fn cost_calculator(&self) -> Option<&dyn CostCalculator> {
        self.pricing.as_ref().map(|p| p as &dyn CostCalculator)
    }

    fn executors(&self) -> ExecutorTable {
        self.executors.clone()
    }
}

impl std::fmt::Debug for ScriptedAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedAgent")
            .field("remaining", &self.remaining())
            .field("runner_calls", &self.runner_calls())
            .field("tools", &self.tools)
            .field("pricing", &self.pricing)
            .finish()
    }
}
