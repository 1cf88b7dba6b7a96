//! # Domain Entities
//!
//! The `Lot` aggregate and its records.

use super::custody::{CustodyRecord, CustodyTracker};
use super::errors::LedgerError;
use super::invariants::invariant_lot_id;
use super::sensors::SensorRegistry;
use super::value_objects::{
    Celsius, Envelope, Identity, IntegrityState, LifecycleStage, Observation, Timestamp,
};
use serde::{Deserialize, Serialize};

/// One entry of the temperature log.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemperatureReading {
    /// What was observed.
    pub observation: Observation,
    /// Who reported it.
    pub reporter: Identity,
    /// When it was recorded.
    pub recorded_at: Timestamp,
}

/// Parameters for creating a lot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotParams {
    /// Lot identifier.
    pub lot_id: String,
    /// Lower bound of the accepted envelope.
    pub temp_min: Celsius,
    /// Upper bound of the accepted envelope.
    pub temp_max: Celsius,
    /// Optional product identifier.
    pub sku: Option<String>,
    /// Optional expiration instant. Informational only.
    pub expiration: Option<Timestamp>,
}

impl LotParams {
    /// Required fields only.
    pub fn new(lot_id: impl Into<String>, temp_min: Celsius, temp_max: Celsius) -> Self {
        Self {
            lot_id: lot_id.into(),
            temp_min,
            temp_max,
            sku: None,
            expiration: None,
        }
    }

    /// Set the product identifier.
    pub fn with_sku(mut self, sku: impl Into<String>) -> Self {
        self.sku = Some(sku.into());
        self
    }

    /// Set the expiration instant.
    pub fn with_expiration(mut self, expiration: Timestamp) -> Self {
        self.expiration = Some(expiration);
        self
    }
}

/// The tracked batch.
///
/// Serialize-only: a lot is rebuilt through its commands, never from raw
/// fields.
#[derive(Clone, Debug, Serialize)]
pub struct Lot {
    lot_id: String,
    sku: Option<String>,
    manufacturer: Identity,
    expiration: Option<Timestamp>,
    envelope: Envelope,
    integrity: IntegrityState,
    custody: CustodyTracker,
    sensors: SensorRegistry,
    temperature_log: Vec<TemperatureReading>,
    created_at: Timestamp,
}

impl Lot {
    /// Create a lot held by its manufacturer.
    pub fn new(params: LotParams, manufacturer: Identity, at: Timestamp) -> Result<Self, LedgerError> {
        invariant_lot_id(&params.lot_id)?;
        let envelope = Envelope::new(params.temp_min, params.temp_max)?;

        Ok(Self {
            lot_id: params.lot_id,
            sku: params.sku,
            manufacturer,
            expiration: params.expiration,
            envelope,
            integrity: IntegrityState::Intact,
            custody: CustodyTracker::new(manufacturer, at),
            sensors: SensorRegistry::new(),
            temperature_log: Vec::new(),
            created_at: at,
        })
    }

    /// Lot identifier.
    pub fn lot_id(&self) -> &str {
        &self.lot_id
    }

    /// Product identifier.
    pub fn sku(&self) -> Option<&str> {
        self.sku.as_deref()
    }

    /// Creator of the lot. Never changes.
    pub fn manufacturer(&self) -> Identity {
        self.manufacturer
    }

    /// Expiration instant.
    pub fn expiration(&self) -> Option<Timestamp> {
        self.expiration
    }

    /// Accepted temperature envelope.
    pub fn envelope(&self) -> Envelope {
        self.envelope
    }

    /// Compliance state.
    pub fn integrity(&self) -> &IntegrityState {
        &self.integrity
    }

    /// Whether an out-of-envelope reading was recorded.
    pub fn is_compromised(&self) -> bool {
        self.integrity.is_compromised()
    }

    /// Current custody holder.
    pub fn current_owner(&self) -> Identity {
        self.custody.current_owner()
    }

    /// Current lifecycle stage.
    pub fn stage(&self) -> LifecycleStage {
        self.custody.stage()
    }

    /// Custody tracker.
    pub fn custody(&self) -> &CustodyTracker {
        &self.custody
    }

    /// Custody history, oldest first.
    pub fn custody_log(&self) -> &[CustodyRecord] {
        self.custody.history()
    }

    /// Sensor registry.
    pub fn sensors(&self) -> &SensorRegistry {
        &self.sensors
    }

    /// Temperature log, oldest first.
    pub fn temperature_log(&self) -> &[TemperatureReading] {
        &self.temperature_log
    }

    /// Most recent reading.
    pub fn last_reading(&self) -> Option<&TemperatureReading> {
        self.temperature_log.last()
    }

    /// Creation time.
    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Serializable read model.
    pub fn info(&self) -> LotInfo {
        LotInfo {
            lot_id: self.lot_id.clone(),
            sku: self.sku.clone(),
            manufacturer: self.manufacturer,
            current_owner: self.current_owner(),
            temp_min: self.envelope.min(),
            temp_max: self.envelope.max(),
            last_observation: self.last_reading().map(|r| r.observation),
            compromised: self.is_compromised(),
            stage: self.stage(),
            custody_entries: self.custody.history().len(),
            readings: self.temperature_log.len(),
            expiration: self.expiration,
            created_at: self.created_at,
        }
    }

    pub(crate) fn custody_mut(&mut self) -> &mut CustodyTracker {
        &mut self.custody
    }

    pub(crate) fn sensors_mut(&mut self) -> &mut SensorRegistry {
        &mut self.sensors
    }

    pub(crate) fn integrity_mut(&mut self) -> &mut IntegrityState {
        &mut self.integrity
    }

    pub(crate) fn push_reading(&mut self, reading: TemperatureReading) {
        self.temperature_log.push(reading);
    }

    /// Rebind the lot to a new identity and envelope. History in the custody
    /// log is kept; readings, sensors and integrity start over.
    pub(crate) fn reset(&mut self, lot_id: String, envelope: Envelope, holder: Identity, at: Timestamp) {
        self.lot_id = lot_id;
        self.envelope = envelope;
        self.integrity = IntegrityState::Intact;
        self.temperature_log.clear();
        self.sensors.clear();
        self.custody.restart(holder, at);
    }
}

/// Snapshot of a lot, as handed to queries and downstream notifiers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotInfo {
    /// Lot identifier.
    pub lot_id: String,
    /// Product identifier.
    pub sku: Option<String>,
    /// Creator.
    pub manufacturer: Identity,
    /// Current holder.
    pub current_owner: Identity,
    /// Envelope lower bound.
    pub temp_min: Celsius,
    /// Envelope upper bound.
    pub temp_max: Celsius,
    /// Most recent observation.
    pub last_observation: Option<Observation>,
    /// Compromise flag.
    pub compromised: bool,
    /// Lifecycle stage.
    pub stage: LifecycleStage,
    /// Number of custody entries.
    pub custody_entries: usize,
    /// Number of temperature readings.
    pub readings: usize,
    /// Expiration instant.
    pub expiration: Option<Timestamp>,
    /// Creation time.
    pub created_at: Timestamp,
}
