//! Agent-to-agent delegation with chain depth bounding
//!
//! Delegation re-enters the router with an incremented chain depth and
//! invokes the target executor directly. A delegation is an in-process
//! call chain, not a cross-process message, so it bypasses the bus queue.
//! Depth above
//! the configured maximum signals a likely routing cycle and aborts the
//! chain immediately; it is fatal and non-retryable.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::agents::{AgentName, AgentRegistry, TaskContext, TaskResult};
use crate::config::{DelegationConfig, RouterConfig};
use crate::error::{Error, Result};
use crate::routing::{RouteOptions, TaskRouter};

/// Per-call delegation options
#[derive(Debug, Clone, Default)]
pub struct DelegateOptions {
    /// Override the configured chain depth limit
    pub max_chain_depth: Option<u32>,
    /// Routing options for the delegated hop
    pub route: RouteOptions,
}

/// Routes and executes delegated tasks under a chain depth bound
#[derive(Clone)]
pub struct Delegator {
    registry: Arc<Mutex<AgentRegistry>>,
    router: TaskRouter,
    config: DelegationConfig,
}

impl Delegator {
    pub fn new(
        registry: Arc<Mutex<AgentRegistry>>,
        router_config: RouterConfig,
        config: DelegationConfig,
    ) -> Self {
        let router = TaskRouter::new(registry.clone(), router_config);
        Self {
            registry,
            router,
            config,
        }
    }

    /// Delegate a task from one agent to the best-fitting other agent
    ///
    /// The context is copied for the hop; concurrent delegation branches
    /// never share a depth counter.
    pub async fn delegate(
        &self,
        from: AgentName,
        description: &str,
        context: &TaskContext,
        options: &DelegateOptions,
    ) -> Result<TaskResult> {
        let max = options.max_chain_depth.unwrap_or(self.config.max_chain_depth);
        let depth = context.chain_depth + 1;
        if depth > max {
            warn!(from = %from, depth, max, "delegation chain depth exceeded");
            return Err(Error::ChainDepthExceeded { depth, max });
        }

        let chained = context.delegated_from(from);
        let routing = self.router.route_task(description, &chained, &options.route).await?;
        let executor = {
            self.registry
                .lock()
                .await
                .executor(routing.agent)
                .ok_or_else(|| Error::UnknownAgent(routing.agent.to_string()))?
        };

        info!(
            from = %from,
            to = %routing.agent,
            depth,
            confidence = routing.confidence,
            "delegating task"
        );

        let started = Instant::now();
        let output = executor.execute(&routing.forwarded_prompt, &chained).await?;
        Ok(TaskResult::success(
            routing.agent,
            output,
            started.elapsed().as_millis() as u64,
        ))
    }
}
