//! # In-Memory Event Bus
//!
//! Fan-out of committed ledger events to in-process subscribers.

use crate::events::{EventFilter, EventRecord};
use crate::ports::EventPublisher;
use async_trait::async_trait;
use lot_telemetry::{metric_inc, EVENTS_PUBLISHED};
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Default channel capacity.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Errors from subscription operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    /// The event bus was closed.
    #[error("Event bus closed")]
    Closed,
}

/// In-memory implementation of the event bus.
///
/// Uses `tokio::sync::broadcast` for multi-producer, multi-consumer semantics.
/// Records published while nobody is subscribed are dropped; the ledger's
/// own event log remains the source of truth. The bus delivers in publish
/// order; `LotLedgerService` publishes each lot's records in sequence order.
pub struct InMemoryEventBus {
    sender: broadcast::Sender<EventRecord>,
    events_published: AtomicU64,
    capacity: usize,
}

impl InMemoryEventBus {
    /// Create a new in-memory event bus with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a new in-memory event bus with specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            events_published: AtomicU64::new(0),
            capacity,
        }
    }

    /// Subscribe to records of every lot matching `filter`.
    #[must_use]
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        debug!(kinds = ?filter.kinds, "New subscription created");
        Subscription {
            receiver: self.sender.subscribe(),
            filter,
            lot_id: None,
        }
    }

    /// Subscribe to records of one lot matching `filter`.
    #[must_use]
    pub fn subscribe_lot(&self, lot_id: impl Into<String>, filter: EventFilter) -> Subscription {
        let lot_id = lot_id.into();
        debug!(lot_id = %lot_id, kinds = ?filter.kinds, "New lot subscription created");
        Subscription {
            receiver: self.sender.subscribe(),
            filter,
            lot_id: Some(lot_id),
        }
    }

    /// Get the number of active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Get the channel capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventBus {
    async fn publish(&self, record: EventRecord) -> usize {
        let kind = record.kind();
        let lot_id = record.lot_id.clone();
        let sequence = record.sequence;

        self.events_published.fetch_add(1, Ordering::Relaxed);
        metric_inc!(EVENTS_PUBLISHED, &[kind.as_str()]);

        match self.sender.send(record) {
            Ok(receivers) => {
                debug!(
                    lot_id = %lot_id,
                    kind = ?kind,
                    sequence,
                    receivers,
                    "Event published"
                );
                receivers
            }
            Err(e) => {
                warn!(
                    lot_id = %lot_id,
                    kind = ?kind,
                    sequence,
                    error = %e,
                    "Event dropped (no receivers)"
                );
                0
            }
        }
    }

    fn events_published(&self) -> u64 {
        self.events_published.load(Ordering::Relaxed)
    }
}

/// A subscription handle for receiving records.
pub struct Subscription {
    receiver: broadcast::Receiver<EventRecord>,
    filter: EventFilter,
    lot_id: Option<String>,
}

impl Subscription {
    fn accepts(&self, record: &EventRecord) -> bool {
        let lot_match = self
            .lot_id
            .as_deref()
            .map_or(true, |lot_id| record.lot_id == lot_id);
        lot_match && self.filter.matches(record)
    }

    /// Receive the next record that matches the filter.
    ///
    /// Returns `None` once the bus is dropped.
    pub async fn recv(&mut self) -> Option<EventRecord> {
        loop {
            let record = match self.receiver.recv().await {
                Ok(r) => r,
                Err(broadcast::error::RecvError::Closed) => return None,
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    debug!(lagged = count, "Subscriber lagged, some events dropped");
                    continue;
                }
            };

            if self.accepts(&record) {
                return Some(record);
            }
        }
    }

    /// Try to receive the next matching record without blocking.
    pub fn try_recv(&mut self) -> Result<Option<EventRecord>, SubscriptionError> {
        loop {
            let record = match self.receiver.try_recv() {
                Ok(r) => r,
                Err(broadcast::error::TryRecvError::Empty) => return Ok(None),
                Err(broadcast::error::TryRecvError::Closed) => {
                    return Err(SubscriptionError::Closed)
                }
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
            };

            if self.accepts(&record) {
                return Ok(Some(record));
            }
        }
    }

    /// Drain every matching record currently buffered.
    pub fn drain(&mut self) -> Vec<EventRecord> {
        let mut records = Vec::new();
        while let Ok(Some(record)) = self.try_recv() {
            records.push(record);
        }
        records
    }

    /// Get the filter for this subscription.
    #[must_use]
    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }
}
