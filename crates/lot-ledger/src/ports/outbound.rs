//! Outbound (Driven) ports for the Lot Integrity Ledger.
//!
//! These traits define dependencies on external systems the ledger service
//! needs for operation.

use crate::domain::{LotInfo, Timestamp};
use crate::events::EventRecord;
use async_trait::async_trait;
use thiserror::Error;

/// Time source for command timestamps.
///
/// Abstracted to allow testing with deterministic time.
pub trait TimeSource: Send + Sync {
    /// Returns the current timestamp in seconds.
    fn now(&self) -> Timestamp;
}

/// Publishes committed ledger events to downstream consumers.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish a record.
    ///
    /// # Returns
    ///
    /// The number of active subscribers that received the record.
    async fn publish(&self, record: EventRecord) -> usize;

    /// Get the total number of records published.
    fn events_published(&self) -> u64;
}

/// Errors from compromise notification delivery.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NotifyError {
    /// The downstream service could not be reached.
    #[error("Notification target unavailable: {0}")]
    Unavailable(String),

    /// The downstream service refused the notification.
    #[error("Notification rejected: {0}")]
    Rejected(String),
}

/// Receives a lot's read model when it becomes compromised.
///
/// Failures never roll back the committed command.
#[async_trait]
pub trait CompromiseNotifier: Send + Sync {
    /// Deliver the post-command snapshot of a newly compromised lot.
    async fn notify(&self, info: &LotInfo) -> Result<(), NotifyError>;
}

/// Mock time source for testing.
#[cfg(test)]
pub struct MockTimeSource {
    time: std::sync::atomic::AtomicU64,
}

#[cfg(test)]
impl MockTimeSource {
    pub fn new(time: Timestamp) -> Self {
        Self {
            time: std::sync::atomic::AtomicU64::new(time),
        }
    }

    pub fn advance(&self, delta: Timestamp) {
        self.time
            .fetch_add(delta, std::sync::atomic::Ordering::SeqCst);
    }
}

#[cfg(test)]
impl TimeSource for MockTimeSource {
    fn now(&self) -> Timestamp {
        self.time.load(std::sync::atomic::Ordering::SeqCst)
    }
}

/// Mock notifier that always fails.
#[cfg(test)]
#[derive(Default)]
pub struct FailingNotifier {
    pub attempts: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
#[async_trait]
impl CompromiseNotifier for FailingNotifier {
    async fn notify(&self, _info: &LotInfo) -> Result<(), NotifyError> {
        self.attempts
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Err(NotifyError::Unavailable("damage service offline".into()))
    }
}
