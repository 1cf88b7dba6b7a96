//! Compromise notifiers.

use crate::domain::LotInfo;
use crate::ports::{CompromiseNotifier, NotifyError};
use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::warn;

/// Writes compromise notifications to the log. Never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

#[async_trait]
impl CompromiseNotifier for TracingNotifier {
    async fn notify(&self, info: &LotInfo) -> Result<(), NotifyError> {
        warn!(
            component = "notifier",
            lot_id = %info.lot_id,
            owner = %info.current_owner,
            temp_min = info.temp_min,
            temp_max = info.temp_max,
            last_observation = ?info.last_observation,
            "Compromised lot reported to damage handling"
        );
        Ok(())
    }
}

/// Keeps every notification in memory.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    received: Mutex<Vec<LotInfo>>,
}

impl RecordingNotifier {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshots received so far, in delivery order.
    pub fn notifications(&self) -> Vec<LotInfo> {
        self.received.lock().clone()
    }

    /// Number of notifications received.
    pub fn count(&self) -> usize {
        self.received.lock().len()
    }
}

#[async_trait]
impl CompromiseNotifier for RecordingNotifier {
    async fn notify(&self, info: &LotInfo) -> Result<(), NotifyError> {
        self.received.lock().push(info.clone());
        Ok(())
    }
}
