//! relay-core: agent routing and orchestration library
//!
//! Routes free-text tasks to specialized agents by keyword, complexity,
//! and priority scoring; dispatches messages over an in-process bus with
//! request/response correlation; bounds agent-to-agent delegation chains;
//! and orchestrates sessions with rolling memory.

pub mod agents;
pub mod bus;
pub mod config;
pub mod delegation;
pub mod error;
pub mod orchestrator;
pub mod routing;

pub use agents::{
    default_profiles, AgentExecutor, AgentInvocation, AgentName, AgentProfile, AgentRegistry,
    FnExecutor, RoutingResult, Task, TaskContext, TaskResult,
};
pub use bus::{Endpoint, Message, MessageBus, MessageId, MessageKind, Payload, SubscriptionId};
pub use config::{BusConfig, Config, DelegationConfig, MemoryConfig, RouterConfig};
pub use delegation::{DelegateOptions, Delegator};
pub use error::{Error, Result};
pub use orchestrator::{AgentInsight, Orchestrator, SessionMemory};
pub use routing::{analyze_complexity, RouteOptions, TaskRouter};
