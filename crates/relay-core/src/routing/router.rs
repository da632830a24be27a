//! Task router
//!
//! Selects the best agent for a task (or a forced one), rewrites the prompt
//! for that agent, and returns a routing decision. Given identical registry
//! state, task text, context, and options, the result is reproducible: no
//! clock or randomness participates in selection, and ties fall back to
//! registration order.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use super::analyzer::analyze_complexity;
use super::scorer::{score_agent, AgentScore};
use crate::agents::{AgentName, AgentRegistry, RoutingResult, TaskContext};
use crate::config::RouterConfig;
use crate::error::{Error, Result};

/// Per-call routing options; unset fields fall back to [`RouterConfig`]
#[derive(Debug, Clone, Default)]
pub struct RouteOptions {
    /// Skip scoring and route to this agent (must be registered)
    pub force_agent: Option<AgentName>,
    /// Override the confidence threshold
    pub min_confidence: Option<u8>,
    /// Override prompt forwarding
    pub enable_prompt_forwarding: Option<bool>,
}

impl RouteOptions {
    pub fn forced(agent: AgentName) -> Self {
        Self {
            force_agent: Some(agent),
            ..Self::default()
        }
    }
}

/// Router over a shared agent registry
#[derive(Clone)]
pub struct TaskRouter {
    registry: Arc<Mutex<AgentRegistry>>,
    config: RouterConfig,
}

impl TaskRouter {
    pub fn new(registry: Arc<Mutex<AgentRegistry>>, config: RouterConfig) -> Self {
        Self { registry, config }
    }

    /// Route a task description to the best-fitting agent
    pub async fn route_task(
        &self,
        description: &str,
        context: &TaskContext,
        options: &RouteOptions,
    ) -> Result<RoutingResult> {
        let registry = self.registry.lock().await;
        let forwarding = options
            .enable_prompt_forwarding
            .unwrap_or(self.config.enable_prompt_forwarding);

        if let Some(forced) = options.force_agent {
            if !registry.contains(forced) {
                return Err(Error::UnknownAgent(forced.to_string()));
            }
            return Ok(RoutingResult {
                agent: forced,
                confidence: 100,
                forwarded_prompt: forward_prompt(forced, description, context, forwarding),
                reasoning: "forced selection".to_string(),
            });
        }

        let complexity = analyze_complexity(description);
        let min_confidence = options.min_confidence.unwrap_or(self.config.min_confidence);

        // Strict > keeps the earliest-registered agent on score ties; the
        // priority component inside the score already favors general agents.
        let mut best: Option<AgentScore> = None;
        for profile in registry.list() {
            let scored = score_agent(description, &profile, complexity);
            match &best {
                None => best = Some(scored),
                Some(current) if scored.score > current.score => best = Some(scored),
                _ => {}
            }
        }
        let best = best.ok_or_else(|| Error::Config("no agents registered".to_string()))?;

        if best.score < min_confidence {
            let fallback = self.config.default_agent;
            if !registry.contains(fallback) {
                return Err(Error::UnknownAgent(fallback.to_string()));
            }
            debug!(
                best = %best.agent,
                score = best.score,
                threshold = min_confidence,
                "no agent met the confidence threshold, falling back"
            );
            return Ok(RoutingResult {
                agent: fallback,
                // a caller-supplied threshold may exceed the confidence scale
                confidence: min_confidence.min(100),
                forwarded_prompt: forward_prompt(fallback, description, context, forwarding),
                reasoning: format!(
                    "no agent met the confidence threshold {min_confidence} (best: {} at {})",
                    best.agent, best.score
                ),
            });
        }

        debug!(
            agent = %best.agent,
            confidence = best.score,
            complexity,
            "routed task"
        );
        Ok(RoutingResult {
            agent: best.agent,
            confidence: best.score,
            forwarded_prompt: forward_prompt(best.agent, description, context, forwarding),
            reasoning: best.reasoning,
        })
    }
}

/// Phrasing that marks a task as already framed for the agent's domain
const EXPLORE_PHRASING: &[&str] = &["search", "find", "locate", "look for", "explore", "grep"];
const PLAN_PHRASING: &[&str] = &["plan", "design", "outline", "strategy"];
const REVIEW_PHRASING: &[&str] = &["review", "analyze", "check", "inspect", "audit"];

/// Rewrite the description into the selected agent's phrasing conventions
fn forward_prompt(
    agent: AgentName,
    description: &str,
    context: &TaskContext,
    forwarding: bool,
) -> String {
    if !forwarding {
        return description.to_string();
    }

    let lower = description.to_lowercase();
    let framed = match agent {
        AgentName::Explore if !contains_any(&lower, EXPLORE_PHRASING) => {
            format!("Search the codebase to find: {description}")
        }
        AgentName::Plan if !contains_any(&lower, PLAN_PHRASING) => {
            format!("Create a detailed plan to: {description}")
        }
        AgentName::Review if !contains_any(&lower, REVIEW_PHRASING) => {
            format!("Review and analyze: {description}")
        }
        // execute's template is identity, as is any already-aligned text
        _ => description.to_string(),
    };

    match context.previous_agent {
        Some(prev) => format!("[delegated from {prev}] {framed}"),
        None => framed,
    }
}

fn contains_any(lower: &str, phrases: &[&str]) -> bool {
    phrases.iter().any(|p| lower.contains(p))
}
