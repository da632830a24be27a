//! Message bus and dispatcher
//!
//! A single dispatcher task drains the queue at a fixed tick interval in
//! FIFO arrival order. For each message it notifies every subscriber, then
//! processes request and broadcast payloads. Executors run on spawned
//! tasks so a slow or hung agent never stalls the drain loop; their
//! failures become structured response messages, never exceptions out of
//! the dispatcher.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::types::{Endpoint, Message, MessageKind, Payload, SubscriptionId};
use crate::agents::{
    AgentExecutor, AgentName, AgentProfile, AgentRegistry, Task, TaskContext, TaskResult,
};
use crate::config::BusConfig;
use crate::error::{Error, Result};

/// Callback invoked for every drained message
///
/// Errors are isolated per subscriber and logged; they never halt the
/// drain loop or affect other subscribers.
pub type SubscriberFn = Box<dyn Fn(&Message) -> Result<()> + Send + Sync>;

struct BusInner {
    registry: Arc<Mutex<AgentRegistry>>,
    queue: Mutex<VecDeque<Message>>,
    subscribers: Mutex<Vec<(SubscriptionId, SubscriberFn)>>,
    config: BusConfig,
}

/// In-process message bus over a shared agent registry
pub struct MessageBus {
    inner: Arc<BusInner>,
    dispatcher: JoinHandle<()>,
}

impl MessageBus {
    /// Create the bus and start its dispatcher task
    ///
    /// Must be called within a tokio runtime.
    pub fn new(registry: Arc<Mutex<AgentRegistry>>, config: BusConfig) -> Self {
        let inner = Arc::new(BusInner {
            registry,
            queue: Mutex::new(VecDeque::new()),
            subscribers: Mutex::new(Vec::new()),
            config,
        });
        let dispatcher = tokio::spawn(dispatch_loop(inner.clone()));
        Self { inner, dispatcher }
    }

    /// The registry this bus routes over
    pub fn registry(&self) -> Arc<Mutex<AgentRegistry>> {
        self.inner.registry.clone()
    }

    /// Register an agent for routing by name
    pub async fn register_agent(&self, profile: AgentProfile, executor: Arc<dyn AgentExecutor>) {
        self.inner.registry.lock().await.register(profile, executor);
    }

    /// Remove an agent binding; returns whether it existed
    pub async fn unregister_agent(&self, name: AgentName) -> bool {
        self.inner.registry.lock().await.unregister(name).is_some()
    }

    /// Fire-and-forget enqueue
    pub async fn send_message(&self, message: Message) {
        self.inner.queue.lock().await.push_back(message);
    }

    /// Subscribe to every drained message
    pub async fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&Message) -> Result<()> + Send + Sync + 'static,
    {
        let id = SubscriptionId::new();
        self.inner
            .subscribers
            .lock()
            .await
            .push((id.clone(), Box::new(callback)));
        id
    }

    /// Remove a subscription; returns whether it existed
    pub async fn unsubscribe(&self, id: &SubscriptionId) -> bool {
        let mut subscribers = self.inner.subscribers.lock().await;
        let before = subscribers.len();
        subscribers.retain(|(sid, _)| sid != id);
        subscribers.len() < before
    }

    /// Current number of live subscriptions
    pub async fn subscriber_count(&self) -> usize {
        self.inner.subscribers.lock().await.len()
    }

    /// Send a task to one agent and await its correlated response
    ///
    /// The one-shot subscription matches on the request id, the reversed
    /// endpoints, and the response kind; it is removed on both the response
    /// and the timeout branch, so subscriptions never outlive their use.
    pub async fn send_task(&self, from: Endpoint, to: AgentName, task: Task) -> Result<TaskResult> {
        let request = Message::request(from.clone(), to, task);
        let correlation = request.id.clone();
        let target = Endpoint::Agent(to);

        let (tx, rx) = oneshot::channel::<TaskResult>();
        let slot = std::sync::Mutex::new(Some(tx));
        let subscription = self
            .subscribe(move |message| {
                if message.kind == MessageKind::Response
                    && message.id == correlation
                    && message.from == target
                    && message.to == from
                {
                    if let Payload::Result(result) = &message.payload {
                        if let Some(tx) = slot.lock().ok().and_then(|mut s| s.take()) {
                            let _ = tx.send(result.clone());
                        }
                    }
                }
                Ok(())
            })
            .await;

        self.send_message(request).await;

        let deadline = Duration::from_millis(self.inner.config.request_timeout_ms);
        let outcome = tokio::time::timeout(deadline, rx).await;
        self.unsubscribe(&subscription).await;

        match outcome {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(_)) => Err(Error::Execution("response channel closed".to_string())),
            Err(_) => Err(Error::Timeout {
                ms: self.inner.config.request_timeout_ms,
            }),
        }
    }

    /// Fan a task out to every capable agent except the sender
    ///
    /// Results are logged per agent, never correlated back to the caller.
    pub async fn broadcast_task(&self, from: Endpoint, task: Task) {
        self.send_message(Message::broadcast(from, task)).await;
    }

    /// Stop the dispatcher; queued messages are discarded
    pub fn shutdown(&self) {
        self.dispatcher.abort();
    }
}

impl Drop for MessageBus {
    fn drop(&mut self) {
        self.dispatcher.abort();
    }
}

async fn dispatch_loop(inner: Arc<BusInner>) {
    let mut ticker =
        tokio::time::interval(Duration::from_millis(inner.config.dispatch_interval_ms));
    loop {
        ticker.tick().await;
        loop {
            let message = { inner.queue.lock().await.pop_front() };
            let Some(message) = message else { break };

            notify_subscribers(&inner, &message).await;

            match message.kind {
                MessageKind::Request => handle_request(inner.clone(), message),
                MessageKind::Broadcast => handle_broadcast(inner.clone(), message),
                MessageKind::Response => {}
            }
        }
    }
}

/// Invoke every subscriber with the message, isolating per-callback failures
async fn notify_subscribers(inner: &Arc<BusInner>, message: &Message) {
    let subscribers = inner.subscribers.lock().await;
    for (id, callback) in subscribers.iter() {
        if let Err(e) = callback(message) {
            warn!(subscription = %id, error = %e, "subscriber callback failed");
        }
    }
}

/// Process a direct request on a spawned task
///
/// Absent targets and unsupported task types become synthesized error
/// responses back to the sender; the bus never throws at the enqueuer.
fn handle_request(inner: Arc<BusInner>, message: Message) {
    tokio::spawn(async move {
        let Endpoint::Agent(target) = message.to else {
            warn!(to = %message.to, "request addressed to a non-agent endpoint, dropping");
            return;
        };
        let Payload::Task(task) = message.payload.clone() else {
            warn!(id = %message.id, "request without a task payload, dropping");
            return;
        };

        let executor = {
            let registry = inner.registry.lock().await;
            match registry.get(target) {
                None => {
                    let error = Error::UnknownAgent(target.to_string());
                    warn!(agent = %target, "request for unregistered agent");
                    let response =
                        Message::response_to(&message, TaskResult::failure(target, error.to_string()));
                    inner.queue.lock().await.push_back(response);
                    return;
                }
                Some(agent) if !agent.profile.can_handle(task.task_type.as_deref()) => {
                    let error = Error::UnsupportedTaskType {
                        agent: target,
                        task_type: task.task_type.clone().unwrap_or_default(),
                    };
                    debug!(agent = %target, "rejecting request for unsupported task type");
                    let response =
                        Message::response_to(&message, TaskResult::failure(target, error.to_string()));
                    inner.queue.lock().await.push_back(response);
                    return;
                }
                Some(agent) => agent.executor.clone(),
            }
        };

        let started = Instant::now();
        let result = match executor.execute(&task.description, &TaskContext::default()).await {
            Ok(output) => {
                TaskResult::success(target, output, started.elapsed().as_millis() as u64)
            }
            Err(e) => {
                error!(agent = %target, error = %e, "executor failed");
                TaskResult::failure(target, e.to_string())
            }
        };
        let response = Message::response_to(&message, result);
        inner.queue.lock().await.push_back(response);
    });
}

/// Fan a broadcast out to every capable agent except the sender
///
/// Each agent runs independently; per-agent failures are logged and never
/// abort the rest of the fan-out.
fn handle_broadcast(inner: Arc<BusInner>, message: Message) {
    tokio::spawn(async move {
        let Payload::Task(task) = message.payload.clone() else {
            warn!(id = %message.id, "broadcast without a task payload, dropping");
            return;
        };
        let sender = match message.from {
            Endpoint::Agent(name) => Some(name),
            _ => None,
        };

        let targets: Vec<(AgentName, Arc<dyn AgentExecutor>)> = {
            let registry = inner.registry.lock().await;
            registry
                .list()
                .into_iter()
                .filter(|p| Some(p.name) != sender && p.can_handle(task.task_type.as_deref()))
                .filter_map(|p| registry.executor(p.name).map(|e| (p.name, e)))
                .collect()
        };

        debug!(from = %message.from, targets = targets.len(), "broadcasting task");
        for (name, executor) in targets {
            let task = task.clone();
            tokio::spawn(async move {
                match executor.execute(&task.description, &TaskContext::default()).await {
                    Ok(_) => info!(agent = %name, "broadcast task completed"),
                    Err(e) => warn!(agent = %name, error = %e, "broadcast task failed"),
                }
            });
        }
    });
}
