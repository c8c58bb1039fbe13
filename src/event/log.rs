//! EventLog - audit trail of bindings and lifecycle transitions
//!
//! - Event: envelope with id + timestamp + kind
//! - EventKind: load, binding and state-change variants
//! - EventLog: thread-safe, append-only log shared by a loader and its controls

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::control::LifecycleState;
use crate::dom::NodeId;

/// Single event in the log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Monotonic sequence ID (for ordering)
    pub id: u64,
    /// Time since the log was created (ms)
    pub timestamp_ms: u64,
    pub kind: EventKind,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    // ═══════════════════════════════════════════
    // LOAD LEVEL
    // ═══════════════════════════════════════════
    LoadStarted {
        roots: Vec<NodeId>,
    },
    LoadFinished {
        success: bool,
        duration_ms: u64,
    },

    // ═══════════════════════════════════════════
    // BINDING LEVEL
    // ═══════════════════════════════════════════
    ControlAttached {
        node: NodeId,
        url: Arc<str>,
    },
    ControlDetached {
        node: NodeId,
    },
    ControlMoved {
        from: NodeId,
        to: NodeId,
        url: Arc<str>,
    },

    // ═══════════════════════════════════════════
    // LIFECYCLE LEVEL
    // ═══════════════════════════════════════════
    StateChanged {
        node: NodeId,
        url: Arc<str>,
        state: LifecycleState,
    },
}

impl EventKind {
    /// URL of the control this event concerns, if any
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::ControlAttached { url, .. }
            | Self::ControlMoved { url, .. }
            | Self::StateChanged { url, .. } => Some(url),
            _ => None,
        }
    }
}

/// Event log shared by a loader and its controls (cheap to clone, shared storage)
///
/// A bounded log keeps the newest `max_events` entries and drops the oldest;
/// ids keep counting across evictions.
#[derive(Clone)]
pub struct EventLog {
    events: Arc<RwLock<VecDeque<Event>>>,
    max_events: Option<usize>,
    start_time: Instant,
    next_id: Arc<AtomicU64>,
}

impl EventLog {
    /// Unbounded log
    pub fn new() -> Self {
        Self {
            events: Arc::new(RwLock::new(VecDeque::new())),
            max_events: None,
            start_time: Instant::now(),
            next_id: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Ring buffer of the newest `max_events` events; `0` means unbounded
    pub fn bounded(max_events: usize) -> Self {
        Self {
            max_events: (max_events > 0).then_some(max_events),
            ..Self::new()
        }
    }

    pub fn max_events(&self) -> Option<usize> {
        self.max_events
    }

    /// Emit an event (thread-safe, returns event ID)
    pub fn emit(&self, kind: EventKind) -> u64 {
        let mut events = self.events.write();
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        if let Some(max) = self.max_events {
            while events.len() >= max {
                events.pop_front();
            }
        }
        events.push_back(Event {
            id,
            timestamp_ms: self.start_time.elapsed().as_millis() as u64,
            kind,
        });
        id
    }

    /// Get all retained events (cloned - use `with_events` for zero-copy access)
    pub fn events(&self) -> Vec<Event> {
        self.events.read().iter().cloned().collect()
    }

    /// Remove and return every retained event, oldest first
    pub fn drain(&self) -> Vec<Event> {
        self.events.write().drain(..).collect()
    }

    /// Discard every retained event
    pub fn clear(&self) {
        self.events.write().clear();
    }

    /// Zero-copy access to events via callback
    ///
    /// Holds read lock for duration of callback - keep it short.
    pub fn with_events<T>(&self, f: impl FnOnce(&VecDeque<Event>) -> T) -> T {
        f(&self.events.read())
    }

    /// Events concerning controls loaded from `url`
    pub fn filter_url(&self, url: &str) -> Vec<Event> {
        self.with_events(|events| {
            events
                .iter()
                .filter(|e| e.kind.url() == Some(url))
                .cloned()
                .collect()
        })
    }

    /// Number of `ControlAttached` events (controls constructed)
    pub fn count_attached(&self) -> usize {
        self.with_events(|events| {
            events
                .iter()
                .filter(|e| matches!(e.kind, EventKind::ControlAttached { .. }))
                .count()
        })
    }

    /// States `url` passed through, in order
    pub fn states_of(&self, url: &str) -> Vec<LifecycleState> {
        self.with_events(|events| {
            events
                .iter()
                .filter_map(|e| match &e.kind {
                    EventKind::StateChanged { url: u, state, .. } if &**u == url => {
                        Some(state.clone())
                    }
                    _ => None,
                })
                .collect()
        })
    }

    /// Serialize to JSON for persistence/debugging
    pub fn to_json(&self) -> Value {
        self.with_events(|events| serde_json::to_value(events).unwrap_or(Value::Null))
    }

    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLog")
            .field("len", &self.len())
            .field("max_events", &self.max_events)
            .finish()
    }
}
