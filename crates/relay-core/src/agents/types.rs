//! Agent types and trait definitions
//!
//! Defines the core types for the routing system:
//! - AgentName: closed set of agent identities
//! - AgentProfile: capabilities and routing hints for one agent
//! - AgentExecutor trait: the async capability bound to an agent
//! - TaskContext: per-chain context passed by value along delegations

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::routing::analyze_complexity;

/// Identity of a specialized agent
///
/// The set is closed: unknown names are rejected at the parse boundary
/// instead of deep inside dispatch logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentName {
    Explore,
    Plan,
    Execute,
    Review,
}

impl AgentName {
    /// All members, in default registration order
    pub const ALL: [AgentName; 4] = [
        AgentName::Explore,
        AgentName::Plan,
        AgentName::Execute,
        AgentName::Review,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentName::Explore => "explore",
            AgentName::Plan => "plan",
            AgentName::Execute => "execute",
            AgentName::Review => "review",
        }
    }
}

impl fmt::Display for AgentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "explore" => Ok(AgentName::Explore),
            "plan" => Ok(AgentName::Plan),
            "execute" => Ok(AgentName::Execute),
            "review" => Ok(AgentName::Review),
            other => Err(Error::UnknownAgent(other.to_string())),
        }
    }
}

/// A unit of work handed to the router or bus
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Free-text description
    pub description: String,
    /// Declared type tag, matched against agent skills on dispatch
    pub task_type: Option<String>,
    /// Derived complexity score, 1..=10
    pub complexity: u8,
}

impl Task {
    /// Create a task and derive its complexity from the description
    pub fn new(description: impl Into<String>) -> Self {
        let description = description.into();
        let complexity = analyze_complexity(&description);
        Self {
            description,
            task_type: None,
            complexity,
        }
    }

    /// Declare a type tag for capability matching
    pub fn with_type(mut self, task_type: impl Into<String>) -> Self {
        self.task_type = Some(task_type.into());
        self
    }
}

/// Static profile describing what an agent is good at
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentProfile {
    pub name: AgentName,
    pub description: String,
    /// Skill tags matched against a task's declared type
    pub skills: Vec<String>,
    /// Keyword triggers matched against the task text when scoring
    pub keywords: Vec<String>,
    /// Lower number = more general-purpose, slightly favored on ties
    pub priority: u8,
    /// Complexity band `[min, max]` this agent is best suited for
    pub complexity_range: (u8, u8),
}

impl AgentProfile {
    pub fn new(name: AgentName, description: impl Into<String>) -> Self {
        Self {
            name,
            description: description.into(),
            skills: vec![],
            keywords: vec![],
            priority: 0,
            complexity_range: (1, 10),
        }
    }

    pub fn with_skills(mut self, skills: Vec<String>) -> Self {
        self.skills = skills;
        self
    }

    pub fn with_keywords(mut self, keywords: Vec<String>) -> Self {
        self.keywords = keywords;
        self
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_complexity_range(mut self, min: u8, max: u8) -> Self {
        self.complexity_range = (min, max);
        self
    }

    /// Whether this agent can handle a task's declared type
    ///
    /// An empty skill list means the agent is general-purpose. An undeclared
    /// task type matches every agent.
    pub fn can_handle(&self, task_type: Option<&str>) -> bool {
        match task_type {
            None => true,
            Some(t) => {
                self.skills.is_empty() || self.skills.iter().any(|s| s.eq_ignore_ascii_case(t))
            }
        }
    }
}

/// Context threaded along one routing/delegation chain
///
/// Passed by value: concurrent chains each own their copy, so depth
/// counters cannot corrupt each other.
#[derive(Debug, Clone, Default)]
pub struct TaskContext {
    /// Bounded recent conversation window
    pub conversation_window: Vec<String>,
    /// Current-state map supplied by the host
    pub current_state: HashMap<String, String>,
    /// Derived user preferences
    pub user_preferences: HashMap<String, String>,
    /// Agent that delegated this task, if chained
    pub previous_agent: Option<AgentName>,
    /// Delegation hops along this causal path
    pub chain_depth: u32,
}

impl TaskContext {
    /// Derive the context for one delegation hop from `from`
    pub fn delegated_from(&self, from: AgentName) -> Self {
        let mut next = self.clone();
        next.previous_agent = Some(from);
        next.chain_depth += 1;
        next
    }
}

/// Outcome of routing one task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingResult {
    pub agent: AgentName,
    /// Fitness estimate, 0..=100
    pub confidence: u8,
    /// Task description rewritten for the selected agent
    pub forwarded_prompt: String,
    pub reasoning: String,
}

/// Result from executing one task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResult {
    pub agent: AgentName,
    pub output: String,
    pub success: bool,
    pub error: Option<String>,
    pub duration_ms: u64,
}

impl TaskResult {
    pub fn success(agent: AgentName, output: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            agent,
            output: output.into(),
            success: true,
            error: None,
            duration_ms,
        }
    }

    pub fn failure(agent: AgentName, error: impl Into<String>) -> Self {
        Self {
            agent,
            output: String::new(),
            success: false,
            error: Some(error.into()),
            duration_ms: 0,
        }
    }
}

/// The async capability bound to an agent name
#[async_trait]
pub trait AgentExecutor: Send + Sync + 'static {
    /// Perform the forwarded task; may fail
    async fn execute(&self, prompt: &str, context: &TaskContext) -> Result<String>;
}

/// Closure-backed executor so hosts and tests can bind agents without
/// writing a new type per agent
pub struct FnExecutor {
    func: Box<dyn Fn(String, TaskContext) -> BoxFuture<'static, Result<String>> + Send + Sync>,
}

impl FnExecutor {
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(String, TaskContext) -> BoxFuture<'static, Result<String>> + Send + Sync + 'static,
    {
        Self {
            func: Box::new(func),
        }
    }

    /// Executor that always succeeds with a fixed output
    pub fn fixed(output: impl Into<String>) -> Self {
        let output = output.into();
        Self::new(move |_, _| {
            let output = output.clone();
            Box::pin(async move { Ok(output) })
        })
    }
}

#[async_trait]
impl AgentExecutor for FnExecutor {
    async fn execute(&self, prompt: &str, context: &TaskContext) -> Result<String> {
        (self.func)(prompt.to_string(), context.clone()).await
    }
}

/// An agent profile bound to its executor
#[derive(Clone)]
pub struct RegisteredAgent {
    pub profile: AgentProfile,
    pub executor: Arc<dyn AgentExecutor>,
}

/// One recorded agent invocation in session memory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentInvocation {
    pub agent: AgentName,
    pub task: String,
    pub confidence: u8,
    pub success: bool,
    pub timestamp: DateTime<Utc>,
}
