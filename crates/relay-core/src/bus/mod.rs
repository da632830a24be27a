//! In-process message bus
//!
//! Queues messages, notifies subscribers, dispatches requests to agents,
//! and correlates responses back to callers. Supports direct requests,
//! uncorrelated broadcasts, and timeout-guarded request/response.
//!
//! ```text
//! send_message / send_task / broadcast_task
//!         │
//!         ▼
//!   FIFO queue ──(tick)──► dispatcher ──► subscribers (isolated)
//!                               │
//!                               ├─ Request:   executor on a spawned task,
//!                               │             result enqueued as Response
//!                               └─ Broadcast: fan-out to capable agents
//! ```

pub mod dispatch;
pub mod types;

pub use dispatch::{MessageBus, SubscriberFn};
pub use types::{Endpoint, Message, MessageId, MessageKind, Payload, SubscriptionId};
