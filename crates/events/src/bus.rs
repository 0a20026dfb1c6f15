//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] carries [`ChangeEvent`]s from the database listener to the
//! snapshot refresher and anything else interested in table changes. It is
//! shared via `Arc<EventBus>`.

use chrono::Utc;
use leadboard_core::types::Timestamp;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// ChangeEvent
// ---------------------------------------------------------------------------

/// The kind of row change reported by the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeOperation {
    Insert,
    Update,
    Delete,
    Truncate,
    /// The notification did not say.
    Unknown,
}

impl ChangeOperation {
    pub fn from_str_value(value: &str) -> Self {
        match value.trim().to_uppercase().as_str() {
            "INSERT" => ChangeOperation::Insert,
            "UPDATE" => ChangeOperation::Update,
            "DELETE" => ChangeOperation::Delete,
            "TRUNCATE" => ChangeOperation::Truncate,
            _ => ChangeOperation::Unknown,
        }
    }
}

/// A change to one of the watched tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Unqualified table name, e.g. `"chats"`.
    pub table: String,
    pub operation: ChangeOperation,
    /// When this process received the notification.
    pub received_at: Timestamp,
}

impl ChangeEvent {
    pub fn new(table: impl Into<String>, operation: ChangeOperation) -> Self {
        Self {
            table: table.into(),
            operation,
            received_at: Utc::now(),
        }
    }

    /// Case-insensitive table comparison.
    pub fn is_for(&self, table: &str) -> bool {
        self.table.eq_ignore_ascii_case(table)
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 256;

/// In-process fan-out event bus.
///
/// ```rust
/// use leadboard_events::bus::{ChangeEvent, ChangeOperation, EventBus};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(ChangeEvent::new("chats", ChangeOperation::Insert));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<ChangeEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// Slow receivers observe `RecvError::Lagged` once the buffer is full.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers. Dropped when nobody
    /// is subscribed.
    pub fn publish(&self, event: ChangeEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
