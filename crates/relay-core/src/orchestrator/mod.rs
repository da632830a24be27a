//! Session orchestrator
//!
//! Drives one prompt through three phases:
//!
//! 1. preplan: build a task context from session memory, route, then
//!    record the prompt
//! 2. execute: run the selected agent's executor with the forwarded prompt
//! 3. postprocess: record the invocation, refresh derived preferences, and
//!    surface insights
//!
//! An executor failure is a failed task, not a failed session: execute maps
//! it to a `TaskResult` with `success: false` and the loop continues.

pub mod memory;

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::agents::{
    AgentInvocation, AgentName, AgentRegistry, RoutingResult, TaskContext, TaskResult,
};
use crate::bus::MessageBus;
use crate::config::Config;
use crate::delegation::{DelegateOptions, Delegator};
use crate::error::{Error, Result};
use crate::routing::{RouteOptions, TaskRouter};

pub use memory::{AgentInsight, SessionMemory, PREFERRED_AGENT_KEY};

/// Orchestrates routing, execution, and memory over a shared registry
pub struct Orchestrator {
    registry: Arc<Mutex<AgentRegistry>>,
    router: TaskRouter,
    delegator: Delegator,
    bus: MessageBus,
    memory: SessionMemory,
    config: Config,
}

impl Orchestrator {
    /// Create an orchestrator over a shared registry
    ///
    /// Starts the bus dispatcher, so this must be called within a tokio
    /// runtime.
    pub fn new(registry: Arc<Mutex<AgentRegistry>>, config: Config) -> Self {
        let router = TaskRouter::new(registry.clone(), config.router.clone());
        let delegator = Delegator::new(
            registry.clone(),
            config.router.clone(),
            config.delegation.clone(),
        );
        let bus = MessageBus::new(registry.clone(), config.bus.clone());
        let memory = SessionMemory::new(config.memory.clone());
        Self {
            registry,
            router,
            delegator,
            bus,
            memory,
            config,
        }
    }

    /// Produce a routing decision plus the task context derived from
    /// session memory, then record the prompt
    ///
    /// The context is built before the append, so the conversation window
    /// holds prior prompts only, never the one being routed.
    pub async fn preplan(
        &mut self,
        prompt: &str,
        options: &RouteOptions,
    ) -> Result<(RoutingResult, TaskContext)> {
        let context = TaskContext {
            conversation_window: self.memory.recent_window(),
            current_state: Default::default(),
            user_preferences: self.memory.preferences().clone(),
            previous_agent: None,
            chain_depth: 0,
        };
        let routing = self.router.route_task(prompt, &context, options).await?;
        self.memory.record_prompt(prompt);
        info!(
            agent = %routing.agent,
            confidence = routing.confidence,
            "preplanned task"
        );
        Ok((routing, context))
    }

    /// Run the routed agent's executor
    ///
    /// Returns `Err` only when the agent has been unregistered since
    /// routing. Executor failures become a failed `TaskResult` so one bad
    /// task never ends the session.
    pub async fn execute(
        &self,
        routing: &RoutingResult,
        context: &TaskContext,
    ) -> Result<TaskResult> {
        let executor = self
            .registry
            .lock()
            .await
            .executor(routing.agent)
            .ok_or_else(|| Error::UnknownAgent(routing.agent.to_string()))?;

        let started = Instant::now();
        match executor.execute(&routing.forwarded_prompt, context).await {
            Ok(output) => Ok(TaskResult::success(
                routing.agent,
                output,
                started.elapsed().as_millis() as u64,
            )),
            Err(err) => {
                error!(agent = %routing.agent, error = %err, "agent execution failed");
                // the result carries the executor's message, not the
                // variant prefix
                let detail = match err {
                    Error::Execution(msg) => msg,
                    other => other.to_string(),
                };
                Ok(TaskResult::failure(routing.agent, detail))
            }
        }
    }

    /// Record the outcome, refresh the derived preferred agent, and return
    /// the current advisory insights
    pub fn postprocess(
        &mut self,
        routing: &RoutingResult,
        result: &TaskResult,
    ) -> Vec<AgentInsight> {
        self.memory.record_invocation(AgentInvocation {
            agent: result.agent,
            task: routing.forwarded_prompt.clone(),
            confidence: routing.confidence,
            success: result.success,
            timestamp: Utc::now(),
        });
        if let Some(preferred) = self.memory.preferred_agent() {
            self.memory.set_preference(PREFERRED_AGENT_KEY, preferred.as_str());
        }
        self.memory.insights()
    }

    /// Run one prompt through preplan, execute, and postprocess
    pub async fn process(&mut self, prompt: &str, options: &RouteOptions) -> Result<TaskResult> {
        let (routing, context) = self.preplan(prompt, options).await?;
        let result = self.execute(&routing, &context).await?;
        self.postprocess(&routing, &result);
        Ok(result)
    }

    /// Delegate a task on behalf of an agent, under the chain depth bound
    pub async fn delegate_task(
        &self,
        from: AgentName,
        description: &str,
        context: &TaskContext,
        options: &DelegateOptions,
    ) -> Result<TaskResult> {
        self.delegator.delegate(from, description, context, options).await
    }

    pub fn memory(&self) -> &SessionMemory {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut SessionMemory {
        &mut self.memory
    }

    pub fn reset_memory(&mut self) {
        self.memory.reset();
    }

    pub fn bus(&self) -> &MessageBus {
        &self.bus
    }

    pub fn registry(&self) -> Arc<Mutex<AgentRegistry>> {
        self.registry.clone()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Swap in a new config, rebuilding the router, delegator, and bus
    ///
    /// Session memory is retained and rebound to the new limits.
    pub fn update_config(&mut self, config: Config) {
        self.router = TaskRouter::new(self.registry.clone(), config.router.clone());
        self.delegator = Delegator::new(
            self.registry.clone(),
            config.router.clone(),
            config.delegation.clone(),
        );
        self.bus.shutdown();
        self.bus = MessageBus::new(self.registry.clone(), config.bus.clone());
        self.memory.set_config(config.memory.clone());
        self.config = config;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::{default_profiles, AgentExecutor, FnExecutor};

    async fn default_registry() -> Arc<Mutex<AgentRegistry>> {
        let mut registry = AgentRegistry::new();
        for profile in default_profiles() {
            let executor: Arc<dyn AgentExecutor> =
                Arc::new(FnExecutor::fixed(format!("{} done", profile.name)));
            registry.register(profile, executor);
        }
        Arc::new(Mutex::new(registry))
    }

    #[tokio::test]
    async fn test_process_routes_executes_and_records() {
        let registry = default_registry().await;
        let mut orchestrator = Orchestrator::new(registry, Config::default());

        let result = orchestrator
            .process(
                "Find all TODO comments in the codebase",
                &RouteOptions::default(),
            )
            .await
            .unwrap();

        assert!(result.success);
        assert_eq!(result.agent, AgentName::Explore);
        assert_eq!(result.output, "explore done");
        assert_eq!(orchestrator.memory().conversation_history().len(), 1);
        assert_eq!(orchestrator.memory().agent_history().len(), 1);
        assert!(orchestrator.memory().agent_history()[0].success);
    }

    #[tokio::test]
    async fn test_failed_executor_is_a_failed_task_not_a_failed_session() {
        let registry = default_registry().await;
        registry.lock().await.register(
            default_profiles().remove(0), // explore
            Arc::new(FnExecutor::new(|_, _| {
                Box::pin(async { Err(Error::Execution("model unavailable".to_string())) })
            })),
        );
        let mut orchestrator = Orchestrator::new(registry, Config::default());

        let failed = orchestrator
            .process(
                "Find all TODO comments in the codebase",
                &RouteOptions::default(),
            )
            .await
            .unwrap();
        assert!(!failed.success);
        assert_eq!(failed.error.as_deref(), Some("model unavailable"));

        // the failure was recorded and the session keeps serving prompts
        assert!(!orchestrator.memory().agent_history()[0].success);
        let next = orchestrator
            .process("fix the bug", &RouteOptions::default())
            .await
            .unwrap();
        assert!(next.success);
    }

    #[tokio::test]
    async fn test_preplan_context_carries_memory() {
        let registry = default_registry().await;
        let mut orchestrator = Orchestrator::new(registry, Config::default());
        orchestrator.memory_mut().set_preference("tone", "terse");
        orchestrator
            .process("fix the bug", &RouteOptions::default())
            .await
            .unwrap();

        let (_, context) = orchestrator
            .preplan("update the docs", &RouteOptions::default())
            .await
            .unwrap();

        // the window holds prior prompts only; the routed prompt is
        // appended afterwards
        assert_eq!(context.conversation_window, vec!["fix the bug"]);
        assert_eq!(
            orchestrator.memory().conversation_history(),
            &["fix the bug", "update the docs"]
        );
        assert_eq!(
            context.user_preferences.get("tone").map(String::as_str),
            Some("terse")
        );
        assert_eq!(context.chain_depth, 0);
    }

    #[tokio::test]
    async fn test_postprocess_derives_preferred_agent() {
        let registry = default_registry().await;
        let mut orchestrator = Orchestrator::new(registry, Config::default());

        for _ in 0..3 {
            orchestrator
                .process("anything", &RouteOptions::forced(AgentName::Review))
                .await
                .unwrap();
        }

        assert_eq!(
            orchestrator
                .memory()
                .preferences()
                .get(PREFERRED_AGENT_KEY)
                .map(String::as_str),
            Some("review")
        );
    }

    #[tokio::test]
    async fn test_insights_appear_after_enough_tasks() {
        let registry = default_registry().await;
        let mut orchestrator = Orchestrator::new(registry, Config::default());

        for _ in 0..5 {
            orchestrator
                .process("anything", &RouteOptions::forced(AgentName::Execute))
                .await
                .unwrap();
        }
        assert!(orchestrator.memory().insights().is_empty());

        orchestrator
            .process("anything", &RouteOptions::forced(AgentName::Execute))
            .await
            .unwrap();
        let insights = orchestrator.memory().insights();
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].agent, AgentName::Execute);
        assert_eq!(insights[0].tasks, 6);
        assert!((insights[0].success_rate - 1.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_delegate_task_passthrough() {
        let registry = default_registry().await;
        let orchestrator = Orchestrator::new(registry, Config::default());

        let result = orchestrator
            .delegate_task(
                AgentName::Plan,
                "Find all TODO comments in the codebase",
                &TaskContext::default(),
                &DelegateOptions::default(),
            )
            .await
            .unwrap();
        assert_eq!(result.agent, AgentName::Explore);
    }

    #[tokio::test]
    async fn test_reset_memory() {
        let registry = default_registry().await;
        let mut orchestrator = Orchestrator::new(registry, Config::default());
        orchestrator
            .process("fix the bug", &RouteOptions::default())
            .await
            .unwrap();

        orchestrator.reset_memory();
        assert!(orchestrator.memory().conversation_history().is_empty());
        assert!(orchestrator.memory().agent_history().is_empty());
    }

    #[tokio::test]
    async fn test_update_config_keeps_memory() {
        let registry = default_registry().await;
        let mut orchestrator = Orchestrator::new(registry, Config::default());
        orchestrator
            .process("fix the bug", &RouteOptions::default())
            .await
            .unwrap();

        let mut config = Config::default();
        config.router.min_confidence = 95;
        orchestrator.update_config(config);

        assert_eq!(orchestrator.memory().conversation_history().len(), 1);
        // the new threshold routes everything to the fallback agent
        let result = orchestrator
            .process("hello there", &RouteOptions::default())
            .await
            .unwrap();
        assert_eq!(result.agent, AgentName::Execute);
    }
}
