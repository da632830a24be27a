//! Configuration management
//!
//! All sections are optional in the TOML file; missing values fall back to
//! the defaults below. Hosts that embed the router directly can construct
//! `Config::default()` and override individual fields.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::agents::AgentName;
use crate::error::{Error, Result};

/// Router behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Minimum confidence a scored agent must reach before it is selected
    #[serde(default = "default_min_confidence")]
    pub min_confidence: u8,

    /// Rewrite task descriptions into per-agent phrasing
    #[serde(default = "default_true")]
    pub enable_prompt_forwarding: bool,

    /// Fallback agent when no agent meets the confidence threshold
    #[serde(default = "default_agent")]
    pub default_agent: AgentName,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            min_confidence: default_min_confidence(),
            enable_prompt_forwarding: true,
            default_agent: default_agent(),
        }
    }
}

/// Message bus timing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusConfig {
    /// Interval between queue drains, in milliseconds
    #[serde(default = "default_dispatch_interval_ms")]
    pub dispatch_interval_ms: u64,

    /// Deadline for a correlated request/response round trip, in milliseconds
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            dispatch_interval_ms: default_dispatch_interval_ms(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

/// Agent-to-agent delegation limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelegationConfig {
    /// Maximum delegation depth along one causal chain
    #[serde(default = "default_max_chain_depth")]
    pub max_chain_depth: u32,
}

impl Default for DelegationConfig {
    fn default() -> Self {
        Self {
            max_chain_depth: default_max_chain_depth(),
        }
    }
}

/// Session memory bounds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Conversation history entries retained
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Recent entries exposed to routing as context
    #[serde(default = "default_context_window")]
    pub context_window: usize,

    /// Recent invocations considered when deriving the preferred agent
    #[serde(default = "default_preference_window")]
    pub preference_window: usize,

    /// Minimum recorded tasks before an agent gets an insight entry
    #[serde(default = "default_insight_min_tasks")]
    pub insight_min_tasks: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
            context_window: default_context_window(),
            preference_window: default_preference_window(),
            insight_min_tasks: default_insight_min_tasks(),
        }
    }
}

/// Main configuration for relay-core
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub router: RouterConfig,

    #[serde(default)]
    pub bus: BusConfig,

    #[serde(default)]
    pub delegation: DelegationConfig,

    #[serde(default)]
    pub memory: MemoryConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| Error::Config(e.to_string()))
    }
}

fn default_min_confidence() -> u8 {
    20
}

fn default_true() -> bool {
    true
}

fn default_agent() -> AgentName {
    AgentName::Execute
}

fn default_dispatch_interval_ms() -> u64 {
    100
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

fn default_max_chain_depth() -> u32 {
    3
}

fn default_history_limit() -> usize {
    50
}

fn default_context_window() -> usize {
    10
}

fn default_preference_window() -> usize {
    10
}

fn default_insight_min_tasks() -> usize {
    5
}
