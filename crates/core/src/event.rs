//! Domain event system: observe store and scope activity without coupling.
//!
//! Events are published when an entry is stored or moves between tiers and
//! when scopes are pushed or popped. Subscribers filter for what they care
//! about; publishing never blocks and never fails.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::context::Tier;
use crate::scope::ScopeId;

/// All domain events in the system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MemoryEvent {
    /// A value was written into a tier
    EntryStored {
        key: String,
        tier: Tier,
        timestamp: DateTime<Utc>,
    },

    /// Retrieval moved an entry one tier toward hot
    EntryPromoted {
        key: String,
        from: Tier,
        to: Tier,
        timestamp: DateTime<Utc>,
    },

    /// Maintenance moved a stale entry toward archived
    EntryDemoted {
        key: String,
        from: Tier,
        to: Tier,
        timestamp: DateTime<Utc>,
    },

    /// Deduplication dropped entries with repeated values
    EntriesDeduplicated {
        removed: usize,
        timestamp: DateTime<Utc>,
    },

    ScopePushed {
        scope_id: ScopeId,
        parent_id: Option<ScopeId>,
        timestamp: DateTime<Utc>,
    },

    ScopePopped {
        scope_id: ScopeId,
        archived_key: String,
        timestamp: DateTime<Utc>,
    },
}

/// Largest number of events a bus buffers per subscriber.
pub const MAX_EVENT_CAPACITY: usize = 1 << 20;

/// A broadcast-based event bus for domain events.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub. Sending is
/// synchronous, so the bus can be used from blocking code.
#[derive(Debug)]
pub struct EventBus {
    sender: broadcast::Sender<Arc<MemoryEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity, clamped to
    /// `1..=MAX_EVENT_CAPACITY`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.clamp(1, MAX_EVENT_CAPACITY));
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: MemoryEvent) {
        // No subscribers is fine
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<MemoryEvent>> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
