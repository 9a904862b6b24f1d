//! Bounded in-process pub/sub bus for pipeline progress events.
//!
//! Every pipeline stage publishes progress here; SSE endpoints (or any
//! other observer) subscribe and drain. Delivery is best-effort: a
//! subscriber that stops draining is dropped rather than
//! back-pressuring the publisher.
//!
//! # Usage
//!
//! Producers (pipeline stages):
//!   bus.publish(PipelineEvent::step("link_scout", "scrape", "Fetching page"));
//!
//! Consumers (SSE endpoints):
//!   let mut sub = bus.subscribe();
//!   for event in bus.recent_history(20) { /* replay */ }
//!   while let Some(event) = sub.recv().await { /* live */ }

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use uuid::Uuid;

/// Per-subscriber queue capacity. A subscriber this far behind is dropped.
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// How many recent events are retained for late subscribers.
pub const DEFAULT_HISTORY_CAPACITY: usize = 200;

/// Category of a progress event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Step,
    Progress,
    Result,
    Error,
    Agent,
}

impl EventKind {
    /// Wire name, matching the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Step => "step",
            Self::Progress => "progress",
            Self::Result => "result",
            Self::Error => "error",
            Self::Agent => "agent",
        }
    }
}

/// An immutable progress notification from a pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineEvent {
    /// Event category
    #[serde(rename = "event_type")]
    pub kind: EventKind,

    /// Which pipeline produced this (e.g. "link_scout")
    pub engine: String,

    /// Stage name (scrape, extract, research, ...)
    pub step: String,

    /// Human-readable progress line
    pub message: String,

    /// Structured payload, stage-specific
    #[serde(default)]
    pub data: serde_json::Value,

    /// When the event was published
    pub timestamp: DateTime<Utc>,
}

impl PipelineEvent {
    /// Create an event of the given kind.
    pub fn new(
        kind: EventKind,
        engine: impl Into<String>,
        step: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            engine: engine.into(),
            step: step.into(),
            message: message.into(),
            data: serde_json::Value::Object(serde_json::Map::new()),
            timestamp: Utc::now(),
        }
    }

    /// A stage-transition event.
    pub fn step(
        engine: impl Into<String>,
        step: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(EventKind::Step, engine, step, message)
    }

    /// A within-stage progress event.
    pub fn progress(
        engine: impl Into<String>,
        step: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(EventKind::Progress, engine, step, message)
    }

    /// A stage-output event.
    pub fn result(
        engine: impl Into<String>,
        step: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(EventKind::Result, engine, step, message)
    }

    /// A failure event.
    pub fn error(
        engine: impl Into<String>,
        step: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(EventKind::Error, engine, step, message)
    }

    /// A background-agent event (worker pool activity).
    pub fn agent(
        engine: impl Into<String>,
        step: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(EventKind::Agent, engine, step, message)
    }

    /// Attach a structured payload.
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }
}

/// A live subscription to the bus.
///
/// Dropping the subscription is enough to detach: the bus prunes the
/// dead queue on its next publish. Call [`PipelineBus::unsubscribe`]
/// to detach eagerly.
pub struct Subscription {
    id: Uuid,
    receiver: mpsc::Receiver<PipelineEvent>,
}

impl Subscription {
    /// Identifier for this subscription (pass to `unsubscribe`).
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Receive the next event, or `None` once detached.
    pub async fn recv(&mut self) -> Option<PipelineEvent> {
        self.receiver.recv().await
    }

    /// Receive without waiting.
    pub fn try_recv(&mut self) -> Option<PipelineEvent> {
        self.receiver.try_recv().ok()
    }
}

struct BusInner {
    subscribers: HashMap<Uuid, mpsc::Sender<PipelineEvent>>,
    history: VecDeque<PipelineEvent>,
}

/// Bounded in-process event broadcaster.
///
/// Thread-safe, cloneable; clones share the same subscriber set and
/// history. Safe for concurrent `publish` from multiple pipelines and
/// concurrent `subscribe`/`unsubscribe` from multiple observers. All
/// methods are synchronous — the internal lock is never held across an
/// await point.
#[derive(Clone)]
pub struct PipelineBus {
    inner: Arc<Mutex<BusInner>>,
    queue_capacity: usize,
    history_capacity: usize,
}

impl PipelineBus {
    /// Create a bus with default capacities (queue 100, history 200).
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_QUEUE_CAPACITY, DEFAULT_HISTORY_CAPACITY)
    }

    /// Create a bus with explicit queue and history capacities.
    pub fn with_capacity(queue_capacity: usize, history_capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(BusInner {
                subscribers: HashMap::new(),
                history: VecDeque::with_capacity(history_capacity),
            })),
            queue_capacity: queue_capacity.max(1),
            history_capacity,
        }
    }

    /// Attach a new subscriber with its own bounded queue.
    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::channel(self.queue_capacity);
        let id = Uuid::new_v4();
        self.inner.lock().unwrap().subscribers.insert(id, tx);
        Subscription { id, receiver: rx }
    }

    /// Detach a subscriber. Unknown ids are ignored.
    pub fn unsubscribe(&self, id: Uuid) {
        self.inner.lock().unwrap().subscribers.remove(&id);
    }

    /// Publish an event to every live subscriber without blocking.
    ///
    /// A subscriber whose queue is full is removed from the subscriber
    /// set; one whose receiver is gone is pruned. The event is also
    /// appended to the bounded history ring.
    pub fn publish(&self, event: PipelineEvent) {
        let mut inner = self.inner.lock().unwrap();

        if inner.history.len() >= self.history_capacity {
            inner.history.pop_front();
        }
        inner.history.push_back(event.clone());

        let mut dead: Vec<Uuid> = Vec::new();
        for (id, tx) in inner.subscribers.iter() {
            match tx.try_send(event.clone()) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::debug!(subscriber = %id, "dropping slow event subscriber");
                    dead.push(*id);
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    dead.push(*id);
                }
            }
        }
        for id in dead {
            inner.subscribers.remove(&id);
        }
    }

    /// The most recent `n` events, oldest first.
    pub fn recent_history(&self, n: usize) -> Vec<PipelineEvent> {
        let inner = self.inner.lock().unwrap();
        let skip = inner.history.len().saturating_sub(n);
        inner.history.iter().skip(skip).cloned().collect()
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().unwrap().subscribers.len()
    }
}

impl Default for PipelineBus {
    fn default() -> Self {
        Self::new()
    }
}
