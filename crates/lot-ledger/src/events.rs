//! # Ledger Events
//!
//! Every committed command emits domain events. Each event is wrapped in an
//! [`EventRecord`] carrying a sequence number (the block-number analogue)
//! and appended to the lot's [`EventLog`]. Records are immutable once
//! appended and are returned in emission order.
//!
//! | Event | Emitted by |
//! |-------|-----------|
//! | `LotCreated` | `create` |
//! | `TemperatureRegistered` | `register_temperature` |
//! | `LotCompromised` | first violating `register_temperature` |
//! | `CustodyTransferred` | `transfer_custody` |
//! | `SensorAuthorizationChanged` | `authorize_sensor` |
//! | `LotReinitialized` | `reinitialize` |

use crate::domain::{Celsius, Identity, LifecycleStage, Observation, Timestamp};
use serde::{Deserialize, Serialize};

/// Domain events.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LedgerEvent {
    /// A lot was created.
    LotCreated {
        /// Lot identifier.
        lot_id: String,
        /// Creator and first owner.
        manufacturer: Identity,
        /// Envelope lower bound.
        temp_min: Celsius,
        /// Envelope upper bound.
        temp_max: Celsius,
    },

    /// A reading was appended to the temperature log.
    TemperatureRegistered {
        /// What was observed.
        observation: Observation,
        /// Who reported it.
        reporter: Identity,
    },

    /// The lot became compromised. Emitted once per integrity epoch.
    LotCompromised {
        /// Owner at the time of the violation.
        owner: Identity,
        /// The violating observation.
        observation: Observation,
        /// Human-readable violation.
        reason: String,
    },

    /// Custody changed hands.
    CustodyTransferred {
        /// Previous holder.
        from: Identity,
        /// New holder.
        to: Identity,
        /// Stage after the transfer.
        stage: LifecycleStage,
        /// Compromise flag at transfer time.
        compromised: bool,
    },

    /// A sensor was enabled or disabled.
    SensorAuthorizationChanged {
        /// Who changed it.
        by: Identity,
        /// Affected sensor.
        sensor: Identity,
        /// New flag.
        enabled: bool,
    },

    /// The lot was rebound to a new identity and envelope.
    LotReinitialized {
        /// Identifier before the command.
        previous_lot_id: String,
        /// Identifier after the command.
        lot_id: String,
        /// New owner (the caller).
        owner: Identity,
        /// New envelope lower bound.
        temp_min: Celsius,
        /// New envelope upper bound.
        temp_max: Celsius,
    },
}

/// Event discriminant, used for filtering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// `LotCreated`.
    LotCreated,
    /// `TemperatureRegistered`.
    TemperatureRegistered,
    /// `LotCompromised`.
    LotCompromised,
    /// `CustodyTransferred`.
    CustodyTransferred,
    /// `SensorAuthorizationChanged`.
    SensorAuthorizationChanged,
    /// `LotReinitialized`.
    LotReinitialized,
}

impl EventKind {
    /// Stable label, also used as the metric label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LotCreated => "lot_created",
            Self::TemperatureRegistered => "temperature_registered",
            Self::LotCompromised => "lot_compromised",
            Self::CustodyTransferred => "custody_transferred",
            Self::SensorAuthorizationChanged => "sensor_authorization_changed",
            Self::LotReinitialized => "lot_reinitialized",
        }
    }
}

impl LedgerEvent {
    /// Discriminant of this event.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::LotCreated { .. } => EventKind::LotCreated,
            Self::TemperatureRegistered { .. } => EventKind::TemperatureRegistered,
            Self::LotCompromised { .. } => EventKind::LotCompromised,
            Self::CustodyTransferred { .. } => EventKind::CustodyTransferred,
            Self::SensorAuthorizationChanged { .. } => EventKind::SensorAuthorizationChanged,
            Self::LotReinitialized { .. } => EventKind::LotReinitialized,
        }
    }
}

/// An emitted event with its position in the log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// 1-based position in the lot's event log.
    pub sequence: u64,
    /// Lot the event belongs to, as named when the event was emitted.
    pub lot_id: String,
    /// Command timestamp.
    pub timestamp: Timestamp,
    /// The event.
    pub event: LedgerEvent,
}

impl EventRecord {
    /// Discriminant of the wrapped event.
    pub fn kind(&self) -> EventKind {
        self.event.kind()
    }

    /// Serialize to JSON for export.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Filter for event queries.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EventFilter {
    /// Kinds to include. Empty means all kinds.
    pub kinds: Vec<EventKind>,
    /// Inclusive lower bound on `sequence`.
    pub since: Option<u64>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific kinds.
    #[must_use]
    pub fn kinds(kinds: Vec<EventKind>) -> Self {
        Self { kinds, since: None }
    }

    /// Restrict to records at or after `sequence`.
    #[must_use]
    pub fn since(mut self, sequence: u64) -> Self {
        self.since = Some(sequence);
        self
    }

    /// Check if a record matches this filter.
    #[must_use]
    pub fn matches(&self, record: &EventRecord) -> bool {
        let kind_match = self.kinds.is_empty() || self.kinds.contains(&record.kind());
        let since_match = self.since.map_or(true, |since| record.sequence >= since);
        kind_match && since_match
    }
}

/// Append-only event history of one lot.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EventLog {
    records: Vec<EventRecord>,
}

impl EventLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a batch produced by one command. Returns the new records.
    pub fn append(
        &mut self,
        lot_id: &str,
        timestamp: Timestamp,
        events: Vec<LedgerEvent>,
    ) -> &[EventRecord] {
        let start = self.records.len();
        for event in events {
            let sequence = self.records.len() as u64 + 1;
            self.records.push(EventRecord {
                sequence,
                lot_id: lot_id.to_string(),
                timestamp,
                event,
            });
        }
        &self.records[start..]
    }

    /// All records, in emission order.
    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    /// Records matching `filter`, in emission order.
    pub fn query(&self, filter: &EventFilter) -> Vec<EventRecord> {
        self.records
            .iter()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect()
    }

    /// Number of records of `kind`.
    pub fn count(&self, kind: EventKind) -> usize {
        self.records.iter().filter(|r| r.kind() == kind).count()
    }

    /// Sequence of the last record, 0 if empty.
    pub fn head(&self) -> u64 {
        self.records.len() as u64
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
