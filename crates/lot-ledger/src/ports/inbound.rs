//! # Inbound Port - LotLedgerApi
//!
//! Primary driving port for hosts of many lots.
//!
//! ## Authorization
//!
//! | Method | Authorized Caller |
//! |--------|-------------------|
//! | `create_lot` | Anyone (first call per lot id) |
//! | `register_temperature` | Per `ReportingPolicy` |
//! | `transfer_custody` | Current owner |
//! | `authorize_sensor` | Per `SensorAdminPolicy` |
//! | `reinitialize` | Per `ReinitializePolicy` |
//!
//! Queries are open.

use crate::domain::{
    Celsius, CustodyRecord, Identity, LedgerError, LotInfo, LotParams, Observation,
    TemperatureReading,
};
use crate::events::{EventFilter, EventRecord};
use async_trait::async_trait;

/// Command and query surface of the ledger service.
///
/// Command timestamps are supplied by the service's time source, not by the
/// caller.
///
/// # Example
///
/// ```rust,ignore
/// use lot_ledger::prelude::*;
///
/// async fn example(api: &impl LotLedgerApi, mfr: Identity, carrier: Identity) {
///     api.create_lot(mfr, LotParams::new("LOT-1", 2, 8)).await?;
///     api.register_temperature("LOT-1", mfr, Observation::Point(5)).await?;
///     api.transfer_custody("LOT-1", mfr, carrier).await?;
/// }
/// ```
#[async_trait]
pub trait LotLedgerApi: Send + Sync {
    /// Create and host a new lot.
    ///
    /// # Errors
    /// - `AlreadyCreated`: a lot with this id is already hosted
    /// - `InvalidTarget`: the caller is the null identity
    /// - `InvalidEnvelope`, `EmptyLotId`: bad parameters
    async fn create_lot(
        &self,
        caller: Identity,
        params: LotParams,
    ) -> Result<Vec<EventRecord>, LedgerError>;

    /// Append a temperature reading.
    ///
    /// # Errors
    /// - `Unauthorized`, `NotOwner`: reporting policy not satisfied
    /// - `AlreadyCompromised`: the lot refuses readings once compromised
    /// - `InvalidObservation`: inverted range
    async fn register_temperature(
        &self,
        lot_id: &str,
        caller: Identity,
        observation: Observation,
    ) -> Result<Vec<EventRecord>, LedgerError>;

    /// Hand custody to `new_owner`.
    ///
    /// # Errors
    /// - `NotOwner`: caller is not the current owner
    /// - `InvalidTarget`: `new_owner` is the null identity
    async fn transfer_custody(
        &self,
        lot_id: &str,
        caller: Identity,
        new_owner: Identity,
    ) -> Result<Vec<EventRecord>, LedgerError>;

    /// Enable or disable a sensor.
    ///
    /// # Errors
    /// - `Unauthorized`: sensor admin policy not satisfied
    /// - `InvalidTarget`: `target` is the null identity
    async fn authorize_sensor(
        &self,
        lot_id: &str,
        caller: Identity,
        target: Identity,
        enabled: bool,
    ) -> Result<Vec<EventRecord>, LedgerError>;

    /// Rebind a lot to a new id and envelope. The lot is re-keyed.
    ///
    /// # Errors
    /// - `ReinitializeDisabled`, `NotOwner`: reinitialize policy not satisfied
    /// - `AlreadyCreated`: `new_lot_id` names another hosted lot
    /// - `InvalidTarget`: the caller is the null identity
    /// - `InvalidEnvelope`, `EmptyLotId`: bad parameters
    async fn reinitialize(
        &self,
        lot_id: &str,
        caller: Identity,
        new_lot_id: &str,
        temp_min: Celsius,
        temp_max: Celsius,
    ) -> Result<Vec<EventRecord>, LedgerError>;

    /// Read model of a lot.
    async fn lot_info(&self, lot_id: &str) -> Result<LotInfo, LedgerError>;

    /// Custody history, oldest first.
    async fn custody_history(&self, lot_id: &str) -> Result<Vec<CustodyRecord>, LedgerError>;

    /// Temperature log, oldest first.
    async fn temperature_history(
        &self,
        lot_id: &str,
    ) -> Result<Vec<TemperatureReading>, LedgerError>;

    /// Events of a lot matching `filter`.
    async fn events(
        &self,
        lot_id: &str,
        filter: EventFilter,
    ) -> Result<Vec<EventRecord>, LedgerError>;

    /// Ids of all hosted lots, sorted.
    async fn lot_ids(&self) -> Vec<String>;
}
