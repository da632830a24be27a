//! Session memory
//!
//! A rolling record of one orchestrator session: conversation history
//! trimmed to a bounded window, agent invocation records, and derived user
//! preferences. Insights (per-agent success rate and average confidence)
//! are advisory only: they are surfaced to the host and never fed back
//! into the confidence scorer's weights.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::agents::{AgentInvocation, AgentName};
use crate::config::MemoryConfig;
use crate::error::Result;

/// Preference key under which the derived preferred agent is stored
pub const PREFERRED_AGENT_KEY: &str = "preferred_agent";

/// Advisory per-agent statistics, computed in postprocess
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentInsight {
    pub agent: AgentName,
    pub tasks: usize,
    /// Fraction of recorded tasks that succeeded, 0.0..=1.0
    pub success_rate: f64,
    pub average_confidence: f64,
}

/// Memory for the lifetime of one orchestrator instance
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMemory {
    conversation_history: Vec<String>,
    agent_history: Vec<AgentInvocation>,
    user_preferences: HashMap<String, String>,
    #[serde(skip, default)]
    config: MemoryConfig,
}

impl SessionMemory {
    pub fn new(config: MemoryConfig) -> Self {
        Self {
            conversation_history: Vec::new(),
            agent_history: Vec::new(),
            user_preferences: HashMap::new(),
            config,
        }
    }

    /// Append a prompt, trimming the history to its bounded window
    pub fn record_prompt(&mut self, prompt: &str) {
        self.conversation_history.push(prompt.to_string());
        let limit = self.config.history_limit;
        if self.conversation_history.len() > limit {
            let excess = self.conversation_history.len() - limit;
            self.conversation_history.drain(..excess);
        }
    }

    pub fn record_invocation(&mut self, invocation: AgentInvocation) {
        self.agent_history.push(invocation);
    }

    /// The recent conversation window exposed to routing
    pub fn recent_window(&self) -> Vec<String> {
        let start = self
            .conversation_history
            .len()
            .saturating_sub(self.config.context_window);
        self.conversation_history[start..].to_vec()
    }

    pub fn conversation_history(&self) -> &[String] {
        &self.conversation_history
    }

    pub fn agent_history(&self) -> &[AgentInvocation] {
        &self.agent_history
    }

    pub fn preferences(&self) -> &HashMap<String, String> {
        &self.user_preferences
    }

    pub fn set_preference(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.user_preferences.insert(key.into(), value.into());
    }

    /// Most frequent agent among the recent preference window
    ///
    /// Frequency ties go to the agent invoked most recently, keeping the
    /// derivation deterministic.
    pub fn preferred_agent(&self) -> Option<AgentName> {
        let start = self
            .agent_history
            .len()
            .saturating_sub(self.config.preference_window);
        let recent = &self.agent_history[start..];
        if recent.is_empty() {
            return None;
        }

        let mut counts: HashMap<AgentName, usize> = HashMap::new();
        let mut last_seen: HashMap<AgentName, usize> = HashMap::new();
        for (index, invocation) in recent.iter().enumerate() {
            *counts.entry(invocation.agent).or_insert(0) += 1;
            last_seen.insert(invocation.agent, index);
        }

        counts
            .into_iter()
            .max_by_key(|(agent, count)| (*count, last_seen[agent]))
            .map(|(agent, _)| agent)
    }

    /// Advisory statistics for agents with enough recorded tasks
    pub fn insights(&self) -> Vec<AgentInsight> {
        let mut grouped: HashMap<AgentName, Vec<&AgentInvocation>> = HashMap::new();
        for invocation in &self.agent_history {
            grouped.entry(invocation.agent).or_default().push(invocation);
        }

        let mut insights: Vec<AgentInsight> = grouped
            .into_iter()
            .filter(|(_, records)| records.len() > self.config.insight_min_tasks)
            .map(|(agent, records)| {
                let tasks = records.len();
                let successes = records.iter().filter(|r| r.success).count();
                let confidence_sum: f64 =
                    records.iter().map(|r| f64::from(r.confidence)).sum();
                AgentInsight {
                    agent,
                    tasks,
                    success_rate: successes as f64 / tasks as f64,
                    average_confidence: confidence_sum / tasks as f64,
                }
            })
            .collect();
        insights.sort_by_key(|i| i.agent.as_str());

        for insight in &insights {
            debug!(
                agent = %insight.agent,
                tasks = insight.tasks,
                success_rate = insight.success_rate,
                average_confidence = insight.average_confidence,
                "agent insight"
            );
        }
        insights
    }

    pub(crate) fn set_config(&mut self, config: MemoryConfig) {
        self.config = config;
    }

    /// Discard all recorded state
    pub fn reset(&mut self) {
        self.conversation_history.clear();
        self.agent_history.clear();
        self.user_preferences.clear();
    }

    /// Snapshot in the canonical on-disk shape
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Persist the snapshot to a file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Restore a snapshot, rebinding it to the given config
    pub fn load(path: impl AsRef<Path>, config: MemoryConfig) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut memory: SessionMemory = serde_json::from_str(&content)?;
        memory.config = config;
        Ok(memory)
    }
}
