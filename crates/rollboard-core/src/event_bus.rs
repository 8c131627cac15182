//! Change notifications for connected displays.
//!
//! Every successful mutation emits one event; the HTTP layer forwards the
//! stream to WebSocket clients so TV screens refresh without polling.
//!
//! ```rust
//! use rollboard_core::event_bus::{names, EventBus};
//!
//! let bus = EventBus::new();
//! let _rx = bus.subscribe();
//! assert_eq!(bus.emit(names::DRAFT_PUBLISHED, &serde_json::json!({"changed": true})), 1);
//! ```

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Events buffered per subscriber before a slow one starts lagging.
const DEFAULT_CAPACITY: usize = 256;

/// Event type identifiers, `area:action`.
pub mod names {
    pub const DRAFT_SAVED: &str = "draft:saved";
    pub const DRAFT_PUBLISHED: &str = "draft:published";
    pub const DRAFT_DISCARDED: &str = "draft:discarded";
    pub const LOGS_APPENDED: &str = "logs:appended";
    pub const LOGS_DELETED: &str = "logs:deleted";
    pub const USERS_CHANGED: &str = "users:changed";
    pub const TV_URLS_CHANGED: &str = "tv-urls:changed";
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastEvent {
    pub event_type: String,
    pub payload: serde_json::Value,
}

impl BroadcastEvent {
    pub fn new(event_type: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            event_type: event_type.into(),
            payload,
        }
    }
}

/// Fan-out of [`BroadcastEvent`]s. Emitting is synchronous and never blocks,
/// so the core's blocking stores can call it directly.
pub struct EventBus {
    sender: broadcast::Sender<BroadcastEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Serialize `payload` and send it. Returns how many subscribers got it;
    /// with nobody listening the event is dropped.
    pub fn emit<T: Serialize>(&self, event_type: &str, payload: &T) -> usize {
        let payload = match serde_json::to_value(payload) {
            Ok(v) => v,
            Err(e) => {
                log::warn!("Dropping {} event, payload not serializable: {}", event_type, e);
                return 0;
            }
        };

        log::debug!("Emitting {}", event_type);
        self.sender
            .send(BroadcastEvent::new(event_type, payload))
            .unwrap_or(0)
    }

    /// Receive events emitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<BroadcastEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================
