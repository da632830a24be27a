//! Bus message types
//!
//! Messages are the unit of exchange on the bus: requests carry tasks toward
//! agents, responses carry results back under the originating request's id,
//! and broadcasts fan a task out to every capable agent.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::agents::{AgentName, Task, TaskResult};

/// Unique message id, used as the request/response correlation key
///
/// UUID v7: timestamp plus random suffix, collision-resistant for the
/// lifetime of a bus instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(String);

impl MessageId {
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A message sender or receiver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endpoint {
    /// A registered agent
    Agent(AgentName),
    /// The hosting application (an orchestrator or external caller)
    Host,
    /// The broadcast sentinel, `*`
    Broadcast,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Agent(name) => f.write_str(name.as_str()),
            Endpoint::Host => f.write_str("host"),
            Endpoint::Broadcast => f.write_str("*"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Request,
    Response,
    Broadcast,
}

/// Message payload: a task on the way in, a result on the way back
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Payload {
    Task(Task),
    Result(TaskResult),
}

/// A message on the bus
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub from: Endpoint,
    pub to: Endpoint,
    pub kind: MessageKind,
    pub payload: Payload,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// A request addressed to one agent
    pub fn request(from: Endpoint, to: AgentName, task: Task) -> Self {
        Self {
            id: MessageId::new(),
            from,
            to: Endpoint::Agent(to),
            kind: MessageKind::Request,
            payload: Payload::Task(task),
            metadata: HashMap::new(),
            created_at: Utc::now(),
        }
    }

    /// A broadcast request addressed to every capable agent but the sender
    pub fn broadcast(from: Endpoint, task: Task) -> Self {
        Self {
            id: MessageId::new(),
            from,
            to: Endpoint::Broadcast,
            kind: MessageKind::Broadcast,
            payload: Payload::Task(task),
            metadata: HashMap::new(),
            created_at: Utc::now(),
        }
    }

    /// The response to a request, carrying its correlation id and the
    /// reversed endpoints
    pub fn response_to(request: &Message, result: TaskResult) -> Self {
        Self {
            id: request.id.clone(),
            from: request.to.clone(),
            to: request.from.clone(),
            kind: MessageKind::Response,
            payload: Payload::Result(result),
            metadata: HashMap::new(),
            created_at: Utc::now(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Handle for one bus subscription
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionId(String);

impl SubscriptionId {
    pub(crate) fn new() -> Self {
        Self(uuid::Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_ids_are_unique() {
        let a = MessageId::new();
        let b = MessageId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn test_response_reverses_endpoints_and_keeps_id() {
        let request = Message::request(Endpoint::Host, AgentName::Plan, Task::new("plan it"));
        let response = Message::response_to(
            &request,
            TaskResult::success(AgentName::Plan, "done", 5),
        );

        assert_eq!(response.id, request.id);
        assert_eq!(response.from, Endpoint::Agent(AgentName::Plan));
        assert_eq!(response.to, Endpoint::Host);
        assert_eq!(response.kind, MessageKind::Response);
    }

    #[test]
    fn test_broadcast_sentinel() {
        let message = Message::broadcast(
            Endpoint::Agent(AgentName::Explore),
            Task::new("announce"),
        );
        assert_eq!(message.to, Endpoint::Broadcast);
        assert_eq!(message.to.to_string(), "*");
        assert_eq!(message.kind, MessageKind::Broadcast);
    }

    #[test]
    fn test_metadata_builder() {
        let message = Message::request(Endpoint::Host, AgentName::Review, Task::new("check"))
            .with_metadata("origin", "test");
        assert_eq!(message.metadata.get("origin").map(String::as_str), Some("test"));
    }
}
