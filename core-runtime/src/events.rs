//! # Event Bus System
//!
//! Provides an event-driven architecture for the collection core using `tokio::sync::broadcast`.
//! Coordinators publish typed run events; notification transports and UIs subscribe
//! without the core knowing about them.
//!
//! ## Overview
//!
//! The event bus system consists of:
//! - **Event Types**: Strongly-typed enum hierarchies for different domains
//! - **EventBus**: Central broadcast channel for publishing events
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐    emit     ┌───────────┐
//! │ Coordinator  ├────────────>│           │    subscribe    ┌──────────────┐
//! │ (per target) │             │ EventBus  ├────────────────>│ Notifier     │
//! └──────────────┘             │ (broadcast│                 └──────────────┘
//! ┌──────────────┐    emit     │  channel) │    subscribe    ┌──────────────┐
//! │ Service      ├────────────>│           ├────────────────>│ Subscriber   │
//! └──────────────┘             └───────────┘                 └──────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{CollectEvent, CoreEvent, EventBus};
//!
//! let event_bus = EventBus::new(100);
//! let event = CoreEvent::Collect(CollectEvent::DuplicateSuppressed {
//!     key: "tmdb:movie:100".to_string(),
//! });
//!
//! // No subscribers is not an error worth handling
//! event_bus.emit(event).ok();
//! ```
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: Subscriber was too slow and missed `n` events.
//!   This is non-fatal; the subscriber can continue receiving new events.
//! - **`RecvError::Closed`**: All senders have been dropped. This indicates shutdown.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event enum published and received through the event bus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Reconciliation pass events
    Collect(CollectEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Collect(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Collect(CollectEvent::RunFailed { .. }) => EventSeverity::Error,
            CoreEvent::Collect(CollectEvent::RunCancelled { .. }) => EventSeverity::Warning,
            CoreEvent::Collect(CollectEvent::RunCompleted { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

// ============================================================================
// Collect Events
// ============================================================================

/// Events emitted around a reconciliation pass against one sync target.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum CollectEvent {
    /// A pass acquired its target and chose a strategy.
    RunStarted {
        run_id: String,
        target: String,
        /// Strategy name (`full_coverage`, `direct_push`, `memory_filtered`, `remote_filtered`).
        strategy: String,
        /// Valid, deduplicated candidates handed to the planner.
        candidates: u64,
    },
    /// A pass finished and its memory update was applied.
    RunCompleted {
        run_id: String,
        target: String,
        attempted: u64,
        succeeded: u64,
        failed: u64,
        /// Memory action applied (`saved`, `appended`, `reset`, `unchanged`).
        memory_action: String,
        duration_ms: u64,
    },
    /// A pass aborted with an error; memory was left untouched.
    RunFailed {
        run_id: String,
        target: String,
        message: String,
    },
    /// A pass was cancelled or timed out; memory was left untouched.
    RunCancelled {
        run_id: String,
        target: String,
        /// Items pushed before the pass stopped.
        items_processed: u64,
    },
    /// An event-driven trigger was dropped because its key was seen recently.
    DuplicateSuppressed { key: String },
}

impl CollectEvent {
    fn description(&self) -> &str {
        match self {
            CollectEvent::RunStarted { .. } => "Collect run started",
            CollectEvent::RunCompleted { .. } => "Collect run completed",
            CollectEvent::RunFailed { .. } => "Collect run failed",
            CollectEvent::RunCancelled { .. } => "Collect run cancelled",
            CollectEvent::DuplicateSuppressed { .. } => "Duplicate trigger suppressed",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to events.
///
/// Cloning is cheap; every clone publishes into the same channel.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    ///
    /// When a subscriber falls behind by more than `capacity` events it
    /// receives `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an error
    /// if there are no active subscribers.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
