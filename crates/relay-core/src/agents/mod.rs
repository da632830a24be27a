//! Agent identities, profiles, and the registry
//!
//! Agents are a closed set of named workers. A profile carries the routing
//! hints (skills, keyword triggers, priority, complexity band); the executor
//! is the async capability that actually performs forwarded work. The
//! registry binds the two and is shared behind a single mutex.

pub mod registry;
pub mod types;

pub use registry::{default_profiles, AgentRegistry};
pub use types::{
    AgentExecutor, AgentInvocation, AgentName, AgentProfile, FnExecutor, RegisteredAgent,
    RoutingResult, Task, TaskContext, TaskResult,
};
